#![no_main]

use libfuzzer_sys::fuzz_target;

use fitspix::pixels::Transform;
use fitspix::scanner::find_all_units;
use fitspix::unit::UnitKind;

fuzz_target!(|data: &[u8]| {
    // Scanning arbitrary bytes must either produce units or fail
    // gracefully - it must NEVER panic.
    let units = match find_all_units(data) {
        Ok(units) => units,
        Err(_) => return,
    };

    // If the scan succeeded, decoding and rendering the discovered image
    // units must not panic either, no matter how hostile the declared
    // geometry is.
    for unit in &units {
        if !unit.kind.is_image() || unit.axes.len() < 2 {
            continue;
        }
        let kind = match fitspix::pixels::SampleKind::from_width(unit.sample_width) {
            Ok(kind) => kind,
            Err(_) => continue,
        };

        let start = (unit.payload_offset as usize).min(data.len());
        let end = unit
            .payload_offset
            .saturating_add(unit.payload_len)
            .min(data.len() as u64) as usize;

        // Cap the declared geometry so fuzzing stays fast; overflow paths
        // are still exercised through DecodedImage::new.
        let width = unit.axes[0] as usize;
        let height = unit.axes[1] as usize;
        if width.saturating_mul(height) > 1 << 16 {
            continue;
        }

        if let Ok(mut image) = fitspix::pixels::DecodedImage::new(
            &data[start..end],
            width,
            height,
            kind,
            unit.affine_zero(),
            unit.affine_scale(),
        ) {
            let _ = image.render(Transform::None, Some(0.01), None);
        }
    }

    // Kind classification is total.
    for unit in &units {
        let _ = matches!(unit.kind, UnitKind::Unknown);
    }
});
