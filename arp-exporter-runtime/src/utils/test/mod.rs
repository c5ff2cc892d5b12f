pub mod frame_collectors;
