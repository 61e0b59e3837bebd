mod version;
mod method;

pub use self::version::Version;
pub use self::method::{is_known_method, requires_length};
