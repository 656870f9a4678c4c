pub mod health;
pub use self::health::health;

pub mod login;
pub use self::login::login;

pub mod join;
pub use self::join::join;

pub mod refresh;
pub use self::refresh::refresh;

pub mod logout;
pub use self::logout::logout;
