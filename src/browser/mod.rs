//! 浏览器资源的获取：连接已有浏览器或启动新实例

pub mod connection;
pub mod headless;

pub use connection::connect_to_browser_and_page;
pub use headless::launch_browser;
