pub use vela_core::*;

#[cfg(feature = "release")]
pub mod release {
    pub use vela_release::*;
}

#[cfg(feature = "fs")]
pub mod fs {
    pub use vela_fs::*;
}

#[cfg(feature = "s3")]
pub mod s3 {
    pub use vela_s3::*;
}

#[cfg(feature = "memory")]
pub mod memory {
    pub use vela_memory::*;
}

pub mod prelude {
    pub use vela_core::prelude::*;

    #[cfg(feature = "release")]
    pub use vela_release::{
        DevOptions, Platform, ReleaseOptions, ReleaseSummary, build_dev_configs, run_release,
    };

    #[cfg(feature = "fs")]
    pub use vela_fs::FileSystemStore;

    #[cfg(feature = "s3")]
    pub use vela_s3::S3Store;

    #[cfg(feature = "memory")]
    pub use vela_memory::MemoryStore;
}
