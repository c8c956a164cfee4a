//! Edits and diagnostics on a rendered pixel buffer.
//!
//! All operations act on the flat 32-bit buffer, the active product of
//! [`DecodedImage::render`]. Backup/restore give the display layer a
//! non-destructive reset point.

use super::codec::DecodedImage;

/// One of the three color channels of the flat buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Red channel (byte 0 of each pixel)
    Red,
    /// Green channel (byte 1)
    Green,
    /// Blue channel (byte 2)
    Blue,
}

impl Channel {
    fn offset(self) -> usize {
        match self {
            Channel::Red => 0,
            Channel::Green => 1,
            Channel::Blue => 2,
        }
    }
}

/// Aggregate statistics of one channel across the whole buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelStats {
    /// Sum of all channel bytes.
    pub sum: u64,
    /// Number of non-zero channel bytes.
    pub nonzero: usize,
    /// Smallest channel byte.
    pub min: u8,
    /// Largest channel byte.
    pub max: u8,
    /// Mean channel byte over all pixels.
    pub mean: f64,
}

impl<'a> DecodedImage<'a> {
    /// Convert the buffer to grayscale: each pixel's three channels are
    /// replaced by their average.
    pub fn grayscale(&mut self) {
        for px in self.pixels.chunks_exact_mut(4) {
            let avg = ((px[0] as u16 + px[1] as u16 + px[2] as u16) / 3) as u8;
            px[0] = avg;
            px[1] = avg;
            px[2] = avg;
        }
    }

    /// Multiply one channel by `factor`, clamped to [0, 2], saturating at
    /// 255.
    pub fn adjust_channel(&mut self, channel: Channel, factor: f64) {
        let factor = factor.clamp(0.0, 2.0);
        let offset = channel.offset();
        for px in self.pixels.chunks_exact_mut(4) {
            let scaled = (px[offset] as f64 * factor).round();
            px[offset] = scaled.min(255.0) as u8;
        }
    }

    /// Snapshot the active buffer so edits can be reverted.
    pub fn backup(&mut self) {
        self.backup = Some(self.pixels.clone());
    }

    /// Restore the last snapshot into the active buffer. Returns whether a
    /// snapshot existed.
    pub fn restore(&mut self) -> bool {
        match &self.backup {
            Some(saved) => {
                self.pixels.clone_from(saved);
                true
            }
            None => false,
        }
    }

    /// Whether a backup snapshot is held.
    pub fn has_backup(&self) -> bool {
        self.backup.is_some()
    }

    /// Aggregate statistics for one channel. All channels accumulate the
    /// same way.
    pub fn channel_stats(&self, channel: Channel) -> ChannelStats {
        let offset = channel.offset();
        let mut sum = 0u64;
        let mut nonzero = 0usize;
        let mut min = u8::MAX;
        let mut max = u8::MIN;
        let mut count = 0usize;

        for px in self.pixels.chunks_exact(4) {
            let v = px[offset];
            sum += v as u64;
            if v != 0 {
                nonzero += 1;
            }
            min = min.min(v);
            max = max.max(v);
            count += 1;
        }

        if count == 0 {
            return ChannelStats {
                sum: 0,
                nonzero: 0,
                min: 0,
                max: 0,
                mean: 0.0,
            };
        }
        ChannelStats {
            sum,
            nonzero,
            min,
            max,
            mean: sum as f64 / count as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixels::{SampleKind, Transform};

    fn rendered(samples: &[i16], width: usize, height: usize) -> (Vec<u8>, usize, usize) {
        let payload: Vec<u8> = samples.iter().flat_map(|s| s.to_be_bytes()).collect();
        (payload, width, height)
    }

    fn render<'a>(payload: &'a [u8], width: usize, height: usize) -> DecodedImage<'a> {
        let mut image =
            DecodedImage::new(payload, width, height, SampleKind::Int16, 0.0, 1.0).unwrap();
        image.render(Transform::None, None, None).unwrap();
        image
    }

    #[test]
    fn grayscale_averages_the_channels() {
        let (payload, w, h) = rendered(&[0, 30, 60, 90], 2, 2);
        let mut image = render(&payload, w, h);
        image.grayscale();

        for px in image.pixels_flat32().chunks_exact(4) {
            assert_eq!(px[0], px[1]);
            assert_eq!(px[1], px[2]);
        }
    }

    #[test]
    fn channel_adjust_clamps_factor_and_saturates() {
        let (payload, w, h) = rendered(&[0, 100, 200, 300], 2, 2);
        let mut image = render(&payload, w, h);

        image.backup();
        // A factor beyond the legal range behaves as 2.
        image.adjust_channel(Channel::Green, 5.0);
        let doubled: Vec<u8> = image
            .pixels_flat32()
            .chunks_exact(4)
            .map(|px| px[1])
            .collect();

        assert!(image.restore());
        image.adjust_channel(Channel::Green, 2.0);
        let explicit: Vec<u8> = image
            .pixels_flat32()
            .chunks_exact(4)
            .map(|px| px[1])
            .collect();
        assert_eq!(doubled, explicit);

        // Saturation: nothing exceeds 255 and a full-green pixel stays 255.
        assert!(explicit.iter().all(|&g| g <= 255));
    }

    #[test]
    fn zero_factor_clears_a_channel() {
        let (payload, w, h) = rendered(&[0, 50, 100, 150], 2, 2);
        let mut image = render(&payload, w, h);
        image.adjust_channel(Channel::Blue, 0.0);

        let stats = image.channel_stats(Channel::Blue);
        assert_eq!(stats.sum, 0);
        assert_eq!(stats.nonzero, 0);
        assert_eq!(stats.max, 0);
    }

    #[test]
    fn backup_and_restore_roundtrip() {
        let (payload, w, h) = rendered(&[0, 50, 100, 150], 2, 2);
        let mut image = render(&payload, w, h);

        assert!(!image.restore(), "no snapshot yet");
        let before = image.pixels_flat32().to_vec();

        image.backup();
        image.grayscale();
        image.adjust_channel(Channel::Red, 0.3);
        assert_ne!(image.pixels_flat32(), &before[..]);

        assert!(image.restore());
        assert_eq!(image.pixels_flat32(), &before[..]);
    }

    #[test]
    fn channel_stats_accumulate_identically_per_channel() {
        let (payload, w, h) = rendered(&[0, 100], 1, 2);
        let image = render(&payload, w, h);

        // min renders [0, 0, 255], max renders [255, 0, 0]: red and blue
        // must produce mirror-image statistics.
        let red = image.channel_stats(Channel::Red);
        let blue = image.channel_stats(Channel::Blue);
        assert_eq!(red.sum, 255);
        assert_eq!(blue.sum, 255);
        assert_eq!(red.nonzero, 1);
        assert_eq!(blue.nonzero, 1);
        assert_eq!(red.mean, blue.mean);
        assert_eq!(red.min, 0);
        assert_eq!(red.max, 255);
    }
}
