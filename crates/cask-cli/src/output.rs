//! Formatted output helpers for CLI commands.

use cask_image::catalog::ImageEntry;

/// Renders a byte count in binary units, e.g. "3.4 MiB".
///
/// Counts below one KiB stay exact; everything else is scaled to the
/// largest unit that keeps the value above one and shown with a single
/// decimal.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

/// Prints the image catalog as an aligned table.
pub fn print_image_table(images: &[ImageEntry]) {
    println!("{:<16} {:<20} {:>10}", "IMAGE ID", "CREATED", "SIZE");
    for image in images {
        let created = image.created.format("%Y-%m-%d %H:%M:%S").to_string();
        println!(
            "{:<16} {:<20} {:>10}",
            image.id,
            created,
            human_size(image.size_bytes)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn human_size_keeps_small_counts_exact() {
        assert_eq!(human_size(0), "0 B");
        assert_eq!(human_size(800), "800 B");
        assert_eq!(human_size(1023), "1023 B");
    }

    #[test]
    fn human_size_scales_to_kib() {
        assert_eq!(human_size(1536), "1.5 KiB");
    }

    #[test]
    fn human_size_scales_to_mib() {
        assert_eq!(human_size(5 * 1024 * 1024), "5.0 MiB");
    }

    #[test]
    fn human_size_caps_at_gib() {
        assert_eq!(human_size(3_221_225_472), "3.0 GiB");
        assert_eq!(human_size(2048 * 1024 * 1024 * 1024), "2048.0 GiB");
    }
}
