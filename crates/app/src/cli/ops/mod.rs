pub mod build;
pub mod resolve;
pub mod version;
pub mod view;

pub use build::Build;
pub use resolve::Resolve;
pub use version::Version;
pub use view::View;
