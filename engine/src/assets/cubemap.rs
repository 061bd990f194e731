//! Six-face cubemap decoding

use super::AssetError;
use image::imageops::{self, FilterType};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Decoded cubemap, RGBA8 faces ordered +x, -x, +y, -y, +z, -z
#[derive(Debug, Clone, PartialEq)]
pub struct CubemapImage {
    /// Face width and height in texels
    pub size: u32,
    pub faces: [Vec<u8>; 6],
}

impl CubemapImage {
    /// A 1x1 cubemap of a single color
    pub fn solid(color: [u8; 4]) -> Self {
        Self {
            size: 1,
            faces: std::array::from_fn(|_| color.to_vec()),
        }
    }

    /// Number of levels in a full mip chain down to 1x1
    pub fn mip_level_count(&self) -> u32 {
        u32::BITS - self.size.max(1).leading_zeros()
    }

    /// Every mip level of one face, largest first
    ///
    /// Empty if the face data does not match the declared size.
    pub fn face_mips(&self, face: usize) -> Vec<Vec<u8>> {
        let face = self.faces[face].clone();
        let Some(mut level) = image::RgbaImage::from_raw(self.size, self.size, face) else {
            return Vec::new();
        };

        let mut mips = Vec::with_capacity(self.mip_level_count() as usize);
        for _ in 1..self.mip_level_count() {
            let next = (level.width() / 2).max(1);
            let smaller = imageops::resize(&level, next, next, FilterType::Triangle);
            mips.push(level.into_raw());
            level = smaller;
        }
        mips.push(level.into_raw());
        mips
    }

    /// Faces with their mip chains in layer order, ready for upload
    pub fn layer_major_bytes(&self) -> Vec<u8> {
        let faces: Vec<Vec<Vec<u8>>> = (0..6)
            .into_par_iter()
            .map(|face| self.face_mips(face))
            .collect();
        faces.into_iter().flatten().flatten().collect()
    }
}

fn decode_face(path: &Path) -> Result<image::RgbaImage, AssetError> {
    let reader = image::ImageReader::open(path).map_err(|source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let decoded = reader
        .with_guessed_format()
        .map_err(|source| AssetError::Io {
            path: path.to_path_buf(),
            source,
        })?
        .decode()
        .map_err(|source| AssetError::Image {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(decoded.to_rgba8())
}

/// Decode six faces in parallel; all faces must be square and the same size
pub fn load_cubemap(paths: &[PathBuf; 6]) -> Result<CubemapImage, AssetError> {
    let decoded: Vec<image::RgbaImage> = paths
        .par_iter()
        .map(|path| decode_face(path))
        .collect::<Result<_, _>>()?;

    let expected = decoded[0].width();
    for (image, path) in decoded.iter().zip(paths) {
        if image.width() != expected || image.height() != expected {
            return Err(AssetError::FaceSize {
                path: path.clone(),
                width: image.width(),
                height: image.height(),
                expected,
            });
        }
    }

    let mut faces = decoded.into_iter().map(image::RgbaImage::into_raw);
    let faces: [Vec<u8>; 6] = std::array::from_fn(|_| faces.next().unwrap_or_default());
    debug!(size = expected, "Decoded cubemap");
    Ok(CubemapImage {
        size: expected,
        faces,
    })
}
