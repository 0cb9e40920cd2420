use std::sync::Arc;

use crate::manifest::{self, LoadError, Manifest, VideoEntry};

pub trait CatalogService: Send + Sync {
    fn load_catalog(&self) -> Result<Manifest, LoadError>;
}

pub struct HttpCatalogService {
    client: Arc<manifest::Client>,
}

impl HttpCatalogService {
    pub fn new(client: Arc<manifest::Client>) -> Self {
        Self { client }
    }
}

impl CatalogService for HttpCatalogService {
    fn load_catalog(&self) -> Result<Manifest, LoadError> {
        self.client.fetch()
    }
}

#[derive(Default)]
pub struct MockCatalogService;

impl CatalogService for MockCatalogService {
    fn load_catalog(&self) -> Result<Manifest, LoadError> {
        Ok(Manifest {
            background_image: "https://cdn.example/backdrop.jpg".into(),
            banners: vec![
                "https://cdn.example/banner-week.jpg".into(),
                "https://cdn.example/banner-live.jpg".into(),
            ],
            videos: vec![
                VideoEntry {
                    title: "Welcome to Streamgrid".into(),
                    thumbnail: "https://cdn.example/welcome.jpg".into(),
                    stream_url: "https://cdn.example/welcome.mp4".into(),
                },
                VideoEntry {
                    title: "Sample stream".into(),
                    thumbnail: "https://cdn.example/sample.jpg".into(),
                    stream_url: "https://cdn.example/sample.m3u8".into(),
                },
                VideoEntry {
                    title: "Broken entry".into(),
                    thumbnail: "https://cdn.example/broken.jpg".into(),
                    stream_url: "".into(),
                },
            ],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_serves_sample_content() {
        let manifest = MockCatalogService.load_catalog().unwrap();
        assert_eq!(manifest.banners.len(), 2);
        assert_eq!(manifest.videos.len(), 3);
        assert_eq!(manifest.videos[0].title, "Welcome to Streamgrid");
    }
}
