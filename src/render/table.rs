use crate::layout::Scene;

/// Conversion applied to every pixel value of the scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableOptions {
    pub px_to_pt: f32,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self { px_to_pt: 0.9 }
    }
}

impl TableOptions {
    pub fn points(&self, px: u32) -> u32 {
        (px as f32 * self.px_to_pt).round() as u32
    }
}

/// HTML plus a plain-text alternative for clipboards without rich text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RichText {
    pub html: String,
    pub plain: String,
}

/// Column widths in points, one per unit, without the spacing.
pub fn column_widths_pt(scene: &Scene, options: &TableOptions) -> Vec<u32> {
    scene
        .placements
        .iter()
        .map(|p| options.points(p.column_width))
        .collect()
}

/// Encodes the scene as a borderless two-row table: annotations on top,
/// base characters below, one column per unit.
///
/// Column spacing becomes right padding on every cell except the last, so the
/// table is as wide as the raster image after unit conversion.
pub fn encode_table(
    scene: &Scene,
    primary_family: &str,
    secondary_family: &str,
    options: &TableOptions,
) -> RichText {
    let widths = column_widths_pt(scene, options);
    let spacing = options.points(scene.spacing);
    let last = scene.placements.len().saturating_sub(1);
    let primary_family = escape(primary_family);
    let secondary_family = escape(secondary_family);

    let cell = |i: usize, align: &str, family: &str, size: u32, color: String, text: &str| {
        let width = widths[i];
        let pad = if i == last { 0 } else { spacing };
        format!(
            r#"<td width="{width}" style="width: {width}pt; min-width: {width}pt; text-align: center; vertical-align: {align}; padding: 0 {pad}pt 0 0;"><span style="font-family: '{family}'; font-size: {size}pt; color: {color}; line-height: 100%;">{text}</span></td>"#,
            text = escape(text),
        )
    };

    let secondary_pt = options.points(scene.secondary_size);
    let primary_pt = options.points(scene.primary_size);

    let mut html = String::from(
        r#"<table border="0" cellpadding="0" cellspacing="0" style="border-collapse: collapse; border: none;"><tr>"#,
    );
    for (i, p) in scene.placements.iter().enumerate() {
        html.push_str(&cell(i, "bottom", &secondary_family, secondary_pt, p.color.to_string(), &p.annotation));
    }
    html.push_str("</tr><tr>");
    for (i, p) in scene.placements.iter().enumerate() {
        html.push_str(&cell(i, "top", &primary_family, primary_pt, p.color.to_string(), &p.base));
    }
    html.push_str("</tr></table>");

    let annotations: Vec<&str> = scene.placements.iter().map(|p| p.annotation.as_str()).collect();
    let bases: String = scene.placements.iter().map(|p| p.base.as_str()).collect();
    RichText {
        html,
        plain: format!("{}\n{}", annotations.join(" "), bases),
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Document, Rgb, Unit};
    use crate::layout::{compose, LayoutParams};
    use crate::test_util::BoxMeasurer;

    fn scene() -> Scene {
        let mut doc = Document::default();
        doc.replace_units(vec![
            Unit::new('你', "nǐ", Rgb::new(255, 0, 0)),
            Unit::new('好', "h<o", Rgb::BLACK),
            Unit::new('吗', "ma", Rgb::BLACK),
        ]);
        doc.primary_size = 30;
        doc.secondary_size = 20;
        compose(&doc, &BoxMeasurer::narrow(), &LayoutParams::default(), 1.0)
    }

    #[test]
    fn two_rows_one_column_per_unit() {
        let rich = encode_table(&scene(), "KaiTi", "Arial", &TableOptions::default());
        assert_eq!(rich.html.matches("<tr>").count(), 2);
        assert_eq!(rich.html.matches("<td ").count(), 6);
        let annotation_row = rich.html.find("nǐ").unwrap();
        let base_row = rich.html.find("你").unwrap();
        assert!(annotation_row < base_row);
        assert!(rich.html.contains("color: #ff0000"));
        assert!(rich.html.contains("font-family: 'KaiTi'; font-size: 27pt"));
        assert!(rich.html.contains("font-family: 'Arial'; font-size: 18pt"));
    }

    #[test]
    fn annotations_are_escaped() {
        let rich = encode_table(&scene(), "KaiTi", "Arial", &TableOptions::default());
        assert!(rich.html.contains("h&lt;o"));
        assert!(!rich.html.contains("h<o"));
        assert_eq!(rich.plain, "nǐ h<o ma\n你好吗");
    }

    #[test]
    fn width_matches_raster_width() {
        let scene = scene();
        for factor in [0.9, 0.75, 1.0, 1.33] {
            let options = TableOptions { px_to_pt: factor };
            let n = scene.placements.len() as f32;
            let table: u32 = column_widths_pt(&scene, &options).iter().sum::<u32>()
                + options.points(scene.spacing) * (scene.placements.len() as u32 - 1);
            let raster = scene.width as f32 * factor;
            assert!(
                (table as f32 - raster).abs() <= n,
                "factor {factor}: table {table} vs raster {raster}"
            );
        }
    }

    #[test]
    fn last_cell_has_no_spacing() {
        let rich = encode_table(&scene(), "KaiTi", "Arial", &TableOptions::default());
        assert_eq!(rich.html.matches("padding: 0 9pt 0 0;").count(), 4);
        assert_eq!(rich.html.matches("padding: 0 0pt 0 0;").count(), 2);
    }
}
