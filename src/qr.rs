// File: qr.rs
// Location: /src/qr.rs

use anyhow::{Context, Result};
use image::{GrayImage, ImageBuffer, Luma};
use qrcode::render::unicode;
use qrcode::{Color, QrCode};
use std::path::Path;

use crate::entry::{ShareConfig, ShareSecurity};

/// `WIFI:` URI understood by phone cameras.
pub fn wifi_payload(config: &ShareConfig) -> String {
    let security = match config.security {
        ShareSecurity::Open => "nopass",
        ShareSecurity::Wep => "WEP",
        ShareSecurity::Wpa => "WPA",
        ShareSecurity::Sae => "SAE",
    };

    let mut payload = format!("WIFI:T:{};S:{};", security, escape(&config.ssid));
    if config.security != ShareSecurity::Open {
        payload.push_str(&format!("P:{};", escape(&config.password)));
    }
    if config.hidden {
        payload.push_str("H:true;");
    }
    payload.push(';');
    payload
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '\\' | ';' | ',' | ':' | '"') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

pub fn render_image(data: &str) -> Result<GrayImage> {
    let code = QrCode::new(data)?;
    let size = code.width();
    let scale = 4;
    let quiet = 4;
    let img_size = ((size + 2 * quiet) * scale) as u32;

    let mut img: GrayImage = ImageBuffer::from_pixel(img_size, img_size, Luma([255]));

    for y in 0..size {
        for x in 0..size {
            if code[(x, y)] == Color::Dark {
                for dy in 0..scale {
                    for dx in 0..scale {
                        img.put_pixel(
                            ((x + quiet) * scale + dx) as u32,
                            ((y + quiet) * scale + dy) as u32,
                            Luma([0]),
                        );
                    }
                }
            }
        }
    }

    Ok(img)
}

pub fn save_png(data: &str, path: &Path) -> Result<()> {
    let img = render_image(data)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    img.save(path)
        .with_context(|| format!("Failed to write QR code to {}", path.display()))?;
    Ok(())
}

/// Terminal rendering with half-block characters.
pub fn render_text(data: &str) -> Result<String> {
    let code = QrCode::new(data)?;
    Ok(code
        .render::<unicode::Dense1x2>()
        .dark_color(unicode::Dense1x2::Light)
        .light_color(unicode::Dense1x2::Dark)
        .build())
}
