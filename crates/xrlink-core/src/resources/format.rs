// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Mapping between [`TextureFormat`]s and native graphics format codes.

use crate::view::TextureFormat;

/// A native pixel format code as exchanged with the runtime.
pub type NativeFormat = i64;

/// Translates abstract texture formats into one graphics API's native codes.
pub trait NativeFormatTable: Send + Sync {
    /// The native code for `format`, or `None` if the API has no equivalent.
    fn native_format(&self, format: TextureFormat) -> Option<NativeFormat>;
}

/// OpenGL ES internal formats.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlFormats;

impl NativeFormatTable for GlFormats {
    fn native_format(&self, format: TextureFormat) -> Option<NativeFormat> {
        match format {
            // GL_SRGB8_ALPHA8
            TextureFormat::Rgba8Srgb => Some(0x8C43),
            // GL has no sized sRGB BGRA format.
            TextureFormat::Bgra8Srgb => None,
            // GL_DEPTH24_STENCIL8
            TextureFormat::D24S8 => Some(0x88F0),
        }
    }
}

/// DXGI formats.
#[derive(Debug, Clone, Copy, Default)]
pub struct DxgiFormats;

impl NativeFormatTable for DxgiFormats {
    fn native_format(&self, format: TextureFormat) -> Option<NativeFormat> {
        match format {
            // DXGI_FORMAT_R8G8B8A8_UNORM_SRGB
            TextureFormat::Rgba8Srgb => Some(29),
            // DXGI_FORMAT_B8G8R8A8_UNORM_SRGB
            TextureFormat::Bgra8Srgb => Some(91),
            // DXGI_FORMAT_D24_UNORM_S8_UINT
            TextureFormat::D24S8 => Some(45),
        }
    }
}

/// Picks the first runtime-offered format that appears in `acceptable`.
///
/// The runtime's order wins: it lists formats from most to least preferred, and
/// `acceptable` only filters that list.
pub fn negotiate_format<T>(
    offered: &[NativeFormat],
    acceptable: &[TextureFormat],
    table: &T,
) -> Option<(TextureFormat, NativeFormat)>
where
    T: NativeFormatTable + ?Sized,
{
    offered.iter().find_map(|&native| {
        acceptable
            .iter()
            .copied()
            .find(|&format| table.native_format(format) == Some(native))
            .map(|format| (format, native))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_order_wins() {
        // Runtime prefers BGRA; both are acceptable.
        let offered = [91, 29, 45];
        let acceptable = [TextureFormat::Rgba8Srgb, TextureFormat::Bgra8Srgb];
        assert_eq!(
            negotiate_format(&offered, &acceptable, &DxgiFormats),
            Some((TextureFormat::Bgra8Srgb, 91))
        );
    }

    #[test]
    fn unknown_formats_are_skipped() {
        let offered = [87, 10, 0x8C43];
        assert_eq!(
            negotiate_format(&offered, &[TextureFormat::Rgba8Srgb], &GlFormats),
            Some((TextureFormat::Rgba8Srgb, 0x8C43))
        );
    }

    #[test]
    fn no_overlap() {
        let offered = [29, 91];
        assert_eq!(
            negotiate_format(&offered, &[TextureFormat::D24S8], &DxgiFormats),
            None
        );
        assert_eq!(negotiate_format(&[], &[TextureFormat::D24S8], &DxgiFormats), None);
    }

    #[test]
    fn gl_has_no_bgra_srgb() {
        assert_eq!(GlFormats.native_format(TextureFormat::Bgra8Srgb), None);
    }
}
