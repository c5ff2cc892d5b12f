mod labels;
pub use self::labels::*;

mod label_cache;
pub use self::label_cache::*;
