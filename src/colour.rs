use egui::Color32;

/// Degrees the rainbow hue moves for every emitted segment.
pub const RAINBOW_HUE_STEP: f32 = 1.0;

/// Parse a colour spec: `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`, `hsl(h, s%, l%)` or a common name.
pub fn parse_colour(spec: &str) -> Option<Color32> {
    let spec = spec.trim();
    if spec.starts_with('#') {
        return Color32::from_hex(spec).ok();
    }
    let lower = spec.to_ascii_lowercase();
    if let Some(args) = lower.strip_prefix("hsl(").and_then(|s| s.strip_suffix(')')) {
        return parse_hsl(args);
    }
    named(&lower)
}

/// Same as [`parse_colour`] but falls back to black.
pub fn colour_or_black(spec: &str) -> Color32 {
    parse_colour(spec).unwrap_or(Color32::BLACK)
}

fn parse_hsl(args: &str) -> Option<Color32> {
    let mut parts = args.split(',').map(|p| p.trim().trim_end_matches(['%', ' ']));
    let h: f32 = parts.next()?.trim_end_matches("deg").parse().ok()?;
    let s: f32 = parts.next()?.parse().ok()?;
    let l: f32 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(hsl_to_rgb(h, s / 100.0, l / 100.0))
}

/// Convert hue in degrees, saturation and lightness in `[0, 1]` to RGB.
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> Color32 {
    let h = h.rem_euclid(360.0);
    let s = s.clamp(0.0, 1.0);
    let l = l.clamp(0.0, 1.0);

    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = l - c / 2.0;
    let (r, g, b) = match h as u32 / 60 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let to_u8 = |v: f32| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    Color32::from_rgb(to_u8(r), to_u8(g), to_u8(b))
}

fn named(name: &str) -> Option<Color32> {
    let colour = match name {
        "black" => Color32::BLACK,
        "white" => Color32::WHITE,
        "red" => Color32::from_rgb(255, 0, 0),
        "green" => Color32::from_rgb(0, 128, 0),
        "blue" => Color32::from_rgb(0, 0, 255),
        "yellow" => Color32::from_rgb(255, 255, 0),
        "orange" => Color32::from_rgb(255, 165, 0),
        "purple" => Color32::from_rgb(128, 0, 128),
        "gray" | "grey" => Color32::from_rgb(128, 128, 128),
        "brown" => Color32::from_rgb(165, 42, 42),
        "pink" => Color32::from_rgb(255, 192, 203),
        "transparent" => Color32::TRANSPARENT,
        _ => return None,
    };
    Some(colour)
}

/// Hue that advances by a fixed step per segment while rainbow mode is on.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RainbowCycle {
    hue: f32,
}

impl RainbowCycle {
    pub fn new(hue: f32) -> Self {
        Self {
            hue: hue.rem_euclid(360.0),
        }
    }

    pub fn hue(&self) -> f32 {
        self.hue
    }

    /// Step the hue and return the colour spec for the new value.
    pub fn advance(&mut self) -> String {
        self.hue = (self.hue + RAINBOW_HUE_STEP) % 360.0;
        format!("hsl({}, 100%, 50%)", self.hue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_forms() {
        assert_eq!(parse_colour("#ff0000"), Some(Color32::from_rgb(255, 0, 0)));
        assert_eq!(parse_colour("#0f0"), Some(Color32::from_rgb(0, 255, 0)));
        assert_eq!(parse_colour("#12345"), None);
        assert_eq!(parse_colour("#gg0000"), None);
        assert_eq!(
            parse_colour(" #ff000080 "),
            Some(Color32::from_rgba_unmultiplied(255, 0, 0, 128))
        );
    }

    #[test]
    fn test_parse_hsl_and_names() {
        assert_eq!(parse_colour("hsl(0, 100%, 50%)"), Some(Color32::from_rgb(255, 0, 0)));
        assert_eq!(parse_colour("hsl(120, 100%, 50%)"), Some(Color32::from_rgb(0, 255, 0)));
        assert_eq!(parse_colour("Blue"), Some(Color32::from_rgb(0, 0, 255)));
        assert_eq!(colour_or_black("chartreuse-ish"), Color32::BLACK);
    }

    #[test]
    fn test_picker_output_parses_back() {
        let colour = Color32::from_rgb(0x33, 0x66, 0x99);
        assert_eq!(colour.to_hex(), "#336699");
        assert_eq!(parse_colour(&colour.to_hex()), Some(colour));
    }

    #[test]
    fn test_rainbow_wraps_at_360() {
        let mut cycle = RainbowCycle::new(358.0);
        assert_eq!(cycle.advance(), "hsl(359, 100%, 50%)");
        assert_eq!(cycle.advance(), "hsl(0, 100%, 50%)");
        assert_eq!(cycle.hue(), 0.0);
    }
}
