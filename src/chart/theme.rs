use crate::chart::scale::Rgb;

/// Visual styling that is not driven by the data.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub background: Rgb,
    pub major_grid: Rgb,
    pub minor_grid: Rgb,
    pub text: Rgb,
    /// Axis lines are hidden when `None`.
    pub axis_line: Option<Rgb>,
    pub font_family: String,
    pub title_size: f64,
    pub label_size: f64,
    pub point_size: u32,
    pub line_width: u32,
}

impl Theme {
    /// White background, light grid, no axis lines or panel border.
    pub fn minimal() -> Self {
        Self {
            background: Rgb(255, 255, 255),
            major_grid: Rgb(235, 235, 235),
            minor_grid: Rgb(245, 245, 245),
            text: Rgb(40, 40, 40),
            axis_line: None,
            font_family: "sans-serif".to_string(),
            title_size: 22.0,
            label_size: 15.0,
            point_size: 5,
            line_width: 2,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::minimal()
    }
}
