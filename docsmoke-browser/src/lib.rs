pub mod error;
pub mod http;
pub mod locator;
pub mod query;
pub mod session;
pub mod trace;
#[cfg(feature = "webdriver")]
pub mod webdriver;

pub use error::SessionError;
pub use http::HttpSession;
pub use locator::Locator;
pub use query::ElementQuery;
pub use session::{BrowserKind, NavResponse, Session, SessionOptions, Timeouts, Viewport};
pub use trace::{TraceEntry, TraceLog};
#[cfg(feature = "webdriver")]
pub use webdriver::WebDriverSession;
