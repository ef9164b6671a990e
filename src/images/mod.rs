/// 图片预加载
pub mod fetcher;
pub mod preloader;
pub mod source;

pub use fetcher::{HttpImageFetcher, ImageFetcher};
pub use preloader::{ImagePreloader, PreloadStats};
pub use source::ImageSource;
