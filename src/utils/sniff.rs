//! 根据文件头魔数推断图片格式。

/// 无法识别时使用的类型
pub const FALLBACK_MIME: &str = "text/plain";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Gif,
    Jpeg,
    Png,
    Webp,
    Bmp,
}

impl ImageKind {
    pub fn mime(self) -> &'static str {
        match self {
            ImageKind::Gif => "image/gif",
            ImageKind::Jpeg => "image/jpeg",
            ImageKind::Png => "image/png",
            ImageKind::Webp => "image/webp",
            ImageKind::Bmp => "image/bmp",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ImageKind::Gif => "gif",
            ImageKind::Jpeg => "jpg",
            ImageKind::Png => "png",
            ImageKind::Webp => "webp",
            ImageKind::Bmp => "bmp",
        }
    }
}

/// 所有 `(偏移, 魔数)` 片段都匹配时才认定为该格式
struct Signature {
    parts: &'static [(usize, &'static [u8])],
    kind: ImageKind,
}

const SIGNATURES: &[Signature] = &[
    Signature { parts: &[(0, b"GIF87a")], kind: ImageKind::Gif },
    Signature { parts: &[(0, b"GIF89a")], kind: ImageKind::Gif },
    Signature { parts: &[(0, &[0xFF, 0xD8, 0xFF])], kind: ImageKind::Jpeg },
    Signature {
        parts: &[(0, &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A])],
        kind: ImageKind::Png,
    },
    Signature { parts: &[(0, b"RIFF"), (8, b"WEBP")], kind: ImageKind::Webp },
    Signature { parts: &[(0, b"BM")], kind: ImageKind::Bmp },
];

impl Signature {
    fn matches(&self, content: &[u8]) -> bool {
        self.parts.iter().all(|&(offset, magic)| {
            content
                .get(offset..offset + magic.len())
                .map_or(false, |window| window == magic)
        })
    }
}

pub fn sniff(content: &[u8]) -> Option<ImageKind> {
    SIGNATURES
        .iter()
        .find(|sig| sig.matches(content))
        .map(|sig| sig.kind)
}

pub fn sniff_mime(content: &[u8]) -> &'static str {
    sniff(content).map(ImageKind::mime).unwrap_or(FALLBACK_MIME)
}

/// 示例图片只会保存为 gif / jpg / png 三种，其余一律按 gif 处理
pub fn example_extension(content: &[u8]) -> &'static str {
    match sniff(content) {
        Some(kind @ (ImageKind::Jpeg | ImageKind::Png)) => kind.extension(),
        _ => ImageKind::Gif.extension(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_known_formats() {
        assert_eq!(sniff_mime(b"GIF89a\x01\x00"), "image/gif");
        assert_eq!(sniff_mime(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00]), "image/jpeg");
        assert_eq!(
            sniff_mime(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00]),
            "image/png"
        );
        assert_eq!(sniff_mime(b"RIFF\x00\x00\x00\x00WEBPVP8 "), "image/webp");
    }

    #[test]
    fn test_sniff_fallback() {
        assert_eq!(sniff_mime(b""), FALLBACK_MIME);
        assert_eq!(sniff_mime(b"hello world"), FALLBACK_MIME);
        // 头部不完整
        assert_eq!(sniff_mime(b"GIF8"), FALLBACK_MIME);
        // 只有偏移 8 处的 WEBP，没有 RIFF 容器头
        assert_eq!(sniff_mime(b"XXXX\x00\x00\x00\x00WEBPVP8 "), FALLBACK_MIME);
    }

    #[test]
    fn test_example_extension() {
        assert_eq!(example_extension(&[0xFF, 0xD8, 0xFF, 0xDB]), "jpg");
        assert_eq!(example_extension(b"GIF87a"), "gif");
        assert_eq!(example_extension(b"RIFF\x00\x00\x00\x00WEBP"), "gif");
        assert_eq!(example_extension(b"garbage"), "gif");
    }
}
