//! Meal-plan projections for download: CSV and PDF. Both take the rows in
//! the order the store returns them (day, then slot) and never reorder.

use std::path::Path;

use genpdf::Element;
use genpdf::elements::{Break, FrameCellDecorator, Paragraph, TableLayout};
use genpdf::style::Style;
use thiserror::Error;

use nutrimeal_types::models::ExportRow;

pub const CSV_HEADER: [&str; 4] = ["Day", "Meal Type", "Recipe Name", "Description"];

const FONT_FAMILY: &str = "LiberationSans";
const MARGIN_MM: i32 = 10;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("pdf: {0}")]
    Pdf(#[from] genpdf::error::Error),
}

pub fn to_csv(rows: &[ExportRow]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(CSV_HEADER)?;
    for row in rows {
        let description = single_line(&row.description);
        writer.write_record([
            row.day.as_str(),
            row.slot.as_str(),
            row.recipe_name.as_str(),
            description.as_str(),
        ])?;
    }

    writer.into_inner().map_err(|e| ExportError::Io(e.into_error()))
}

/// Renders the plan as a one-table A4 document. Fonts are loaded from
/// `font_dir` on every call; this runs on the blocking pool.
pub fn to_pdf(rows: &[ExportRow], font_dir: &Path) -> Result<Vec<u8>, ExportError> {
    let font_family = genpdf::fonts::from_files(font_dir, FONT_FAMILY, None)?;

    let mut doc = genpdf::Document::new(font_family);
    doc.set_title("Meal Plan");
    doc.set_font_size(10);

    let mut decorator = genpdf::SimplePageDecorator::new();
    decorator.set_margins(MARGIN_MM);
    doc.set_page_decorator(decorator);

    doc.push(Paragraph::new("Your Meal Plan").styled(Style::new().bold().with_font_size(16)));
    doc.push(Break::new(1));

    let mut table = TableLayout::new(vec![2, 2, 3, 5]);
    table.set_cell_decorator(FrameCellDecorator::new(true, true, false));

    let mut header = table.row();
    for title in CSV_HEADER {
        header.push_element(Paragraph::new(title).styled(Style::new().bold()).padded(1));
    }
    header.push()?;

    for row in rows {
        table
            .row()
            .element(Paragraph::new(row.day.as_str()).padded(1))
            .element(Paragraph::new(row.slot.as_str()).padded(1))
            .element(Paragraph::new(row.recipe_name.as_str()).padded(1))
            .element(Paragraph::new(single_line(&row.description)).padded(1))
            .push()?;
    }
    doc.push(table);

    let mut out = Vec::new();
    doc.render(&mut out)?;
    Ok(out)
}

fn single_line(text: &str) -> String {
    text.split(['\r', '\n']).filter(|s| !s.is_empty()).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use nutrimeal_types::models::{Day, MealSlot};

    fn row(day: Day, slot: MealSlot, name: &str, description: &str) -> ExportRow {
        ExportRow {
            day,
            slot,
            recipe_name: name.into(),
            description: description.into(),
        }
    }

    #[test]
    fn csv_has_header_and_one_line_per_row() {
        let rows = vec![
            row(Day::Monday, MealSlot::Breakfast, "Porridge", "Oats"),
            row(Day::Wednesday, MealSlot::Dinner, "Curry", "Spicy"),
        ];

        let text = String::from_utf8(to_csv(&rows).unwrap()).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Day,Meal Type,Recipe Name,Description");
        assert_eq!(lines[1], "Monday,Breakfast,Porridge,Oats");
        assert_eq!(lines[2], "Wednesday,Dinner,Curry,Spicy");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn csv_quotes_commas_and_quotes() {
        let rows = vec![row(
            Day::Friday,
            MealSlot::Lunch,
            "Salad, green",
            "The \"best\" one\nreally",
        )];

        let text = String::from_utf8(to_csv(&rows).unwrap()).unwrap();
        assert_eq!(
            text.lines().nth(1).unwrap(),
            r#"Friday,Lunch,"Salad, green","The ""best"" one really""#
        );
    }

    const SYSTEM_FONTS: &str = "/usr/share/fonts/truetype/dejavu";

    /// Lays out the DejaVu family under the file names the renderer loads.
    /// Returns `None` when the host has no DejaVu fonts installed.
    fn font_dir() -> Option<tempfile::TempDir> {
        let dir = tempfile::tempdir().unwrap();
        for (source, style) in [
            ("DejaVuSans.ttf", "Regular"),
            ("DejaVuSans-Bold.ttf", "Bold"),
            ("DejaVuSans-Oblique.ttf", "Italic"),
            ("DejaVuSans-BoldOblique.ttf", "BoldItalic"),
        ] {
            let target = dir.path().join(format!("{FONT_FAMILY}-{style}.ttf"));
            std::fs::copy(Path::new(SYSTEM_FONTS).join(source), target).ok()?;
        }
        Some(dir)
    }

    #[test]
    fn pdf_renders_the_plan() {
        let Some(fonts) = font_dir() else {
            eprintln!("DejaVu fonts not installed, skipping PDF render");
            return;
        };
        let rows = vec![
            row(Day::Monday, MealSlot::Breakfast, "Porridge", "Oats with honey"),
            row(Day::Sunday, MealSlot::Snacks, "Nuts", ""),
        ];

        let pdf = to_pdf(&rows, fonts.path()).unwrap();
        assert!(pdf.starts_with(b"%PDF"));
        assert!(pdf.len() > 1000);
    }

    #[test]
    fn pdf_without_fonts_is_an_error() {
        let rows = vec![row(Day::Monday, MealSlot::Snacks, "Nuts", "")];
        let result = to_pdf(&rows, Path::new("/nonexistent/fonts"));
        assert!(matches!(result, Err(ExportError::Pdf(_))));
    }
}
