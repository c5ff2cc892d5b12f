pub mod runner;

/// Frame sources and injectors for exercising sessions without a network interface.
pub mod test;
