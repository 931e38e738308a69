use eframe::egui::Color32;

#[derive(Debug, Clone)]
pub struct Theme {
    pub name: String,
    pub background: Color32,
    /// Drawn behind a slide whose image has not decoded yet.
    pub placeholder: Color32,
    pub foreground: Color32,
    pub heading_color: Color32,
    pub accent: Color32,
    pub button_background: Color32,
    pub button_foreground: Color32,
    pub title_size: f32,
    pub body_size: f32,
    pub button_size: f32,
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            name: "dark".to_string(),
            background: Color32::from_rgb(0x1E, 0x1E, 0x1E),
            placeholder: Color32::from_rgb(0x2D, 0x2D, 0x2D),
            foreground: Color32::from_rgb(0xC8, 0xC8, 0xC8),
            heading_color: Color32::WHITE,
            accent: Color32::from_rgb(0x52, 0x94, 0xE2),
            button_background: Color32::from_rgb(0x52, 0x94, 0xE2),
            button_foreground: Color32::WHITE,
            title_size: 56.0,
            body_size: 26.0,
            button_size: 20.0,
        }
    }

    pub fn light() -> Self {
        Self {
            name: "light".to_string(),
            background: Color32::WHITE,
            placeholder: Color32::from_rgb(0xF5, 0xF5, 0xF5),
            foreground: Color32::from_rgb(0x1A, 0x1A, 0x2E),
            heading_color: Color32::from_rgb(0x16, 0x21, 0x3E),
            accent: Color32::from_rgb(0x0F, 0x34, 0x60),
            button_background: Color32::from_rgb(0x0F, 0x34, 0x60),
            button_foreground: Color32::WHITE,
            title_size: 56.0,
            body_size: 26.0,
            button_size: 20.0,
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name {
            "dark" => Self::dark(),
            _ => Self::light(),
        }
    }

    pub fn toggled(&self) -> Self {
        if self.name == "dark" {
            Self::light()
        } else {
            Self::dark()
        }
    }

    /// Apply opacity to a color
    pub fn with_opacity(color: Color32, opacity: f32) -> Color32 {
        Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), (opacity * 255.0) as u8)
    }

    /// Scale text for narrow viewports.
    pub fn scaled(&self, size: f32, wide: bool) -> f32 {
        if wide { size } else { size * 0.6 }
    }
}
