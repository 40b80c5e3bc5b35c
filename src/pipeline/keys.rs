//! Storage keys of derived objects. Every key is scoped by asset id.

use crate::image::rasterize::OutputFormat;

pub fn vector(asset_id: &str) -> String {
    format!("assets/svg/{asset_id}.svg")
}

pub fn normalized_vector(asset_id: &str) -> String {
    format!("assets/normalized/{asset_id}.svg")
}

pub fn raster(asset_id: &str, size: u32, format: OutputFormat) -> String {
    format!("assets/normalized/{asset_id}-{size}.{}", format.extension())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys() {
        assert_eq!(vector("heron"), "assets/svg/heron.svg");
        assert_eq!(normalized_vector("heron"), "assets/normalized/heron.svg");
        assert_eq!(
            raster("heron", 512, OutputFormat::Lossless),
            "assets/normalized/heron-512.png"
        );
        assert_eq!(
            raster("heron", 256, OutputFormat::Lossy),
            "assets/normalized/heron-256.avif"
        );
    }
}
