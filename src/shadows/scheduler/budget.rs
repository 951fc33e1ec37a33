// src/shadows/scheduler/budget.rs
// Memory-budget enforcement for the shadow-buffer texture ring

use log::warn;

pub(crate) const MIN_BUFFER_RESOLUTION: u32 = 64;

fn estimate_bytes(width: u32, height: u32, bytes_per_pixel: u32, texture_count: u32) -> u64 {
    (width as u64) * (height as u64) * (bytes_per_pixel as u64) * (texture_count as u64)
}

/// Halve the buffer resolution until the planned allocation fits the budget.
pub(crate) fn clamp_to_budget(
    width: &mut u32,
    height: &mut u32,
    bytes_per_pixel: u32,
    texture_count: u32,
    max_bytes: u64,
) {
    if texture_count == 0 {
        return;
    }

    let initial = (*width, *height);
    let budget_mib = max_bytes as f64 / (1024.0 * 1024.0);

    loop {
        let usage = estimate_bytes(*width, *height, bytes_per_pixel, texture_count);

        if usage <= max_bytes {
            if (*width, *height) != initial {
                log::info!(
                    "shadow buffer: downscaled from {}x{} to {}x{} to fit {:.1} MiB budget ({} textures, {:.2} MiB)",
                    initial.0,
                    initial.1,
                    width,
                    height,
                    budget_mib,
                    texture_count,
                    usage as f64 / (1024.0 * 1024.0)
                );
            } else {
                log::debug!(
                    "shadow buffer: {}x{} ({} textures, {:.2} MiB / {:.1} MiB budget)",
                    width,
                    height,
                    texture_count,
                    usage as f64 / (1024.0 * 1024.0),
                    budget_mib
                );
            }
            break;
        }

        let next_w = (*width / 2).max(MIN_BUFFER_RESOLUTION.min(*width));
        let next_h = (*height / 2).max(MIN_BUFFER_RESOLUTION.min(*height));
        if (next_w, next_h) == (*width, *height) {
            warn!(
                "shadow buffer exceeds {:.1} MiB budget at minimum resolution ({}x{}, {} textures, {:.2} MiB)",
                budget_mib,
                width,
                height,
                texture_count,
                usage as f64 / (1024.0 * 1024.0)
            );
            break;
        }
        *width = next_w;
        *height = next_h;
    }
}
