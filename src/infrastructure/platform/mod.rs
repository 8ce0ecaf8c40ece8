pub mod desktop;

pub use desktop::DesktopPlatform;
