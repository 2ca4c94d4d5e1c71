//! Markup table parser
//!
//! Results pages have no stable column layout, so extraction is
//! position-tolerant: each `<table>`, nested ones included, is scanned, its
//! first row is treated as a header, and every later row is run through a
//! [`RowLayout`]. Rows the layout cannot use are dropped without error.

use transcript_core::{grade_of, round2, weighted_average, FetchedItem, FetchedTerm, MISSING_TEXT};
use transcript_state::MAX_TOTAL_SCORE;

use crate::html::{all_elements, cell_text, elements, lower_ascii};

/// Cell positions for each field of a course row.
///
/// Fields listing several positions are tried in order; the first cell that
/// yields a value wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowLayout {
    /// Rows with fewer cells are dropped
    pub min_cells: usize,
    pub code: usize,
    pub name: usize,
    pub score: Vec<usize>,
    pub credits: Vec<usize>,
    pub result: usize,
    pub grade: usize,
    /// Used when no credits cell parses to a positive number
    pub default_credits: u32,
}

impl Default for RowLayout {
    fn default() -> Self {
        RowLayout {
            min_cells: 4,
            code: 0,
            name: 1,
            score: vec![2, 3],
            credits: vec![4, 5],
            result: 6,
            grade: 7,
            default_credits: 4,
        }
    }
}

impl RowLayout {
    /// Extract one item from a row's cell texts.
    pub fn extract(&self, cells: &[String]) -> Option<FetchedItem> {
        if cells.len() < self.min_cells {
            return None;
        }
        let code = text_at(cells, self.code)?;
        let name = text_at(cells, self.name)?;
        let score = first_match(cells, &self.score, leading_int);
        let credits = first_match(cells, &self.credits, |s| leading_int(s).filter(|c| *c > 0))
            .unwrap_or(self.default_credits);

        Some(FetchedItem {
            code,
            name,
            score,
            credits,
            result: text_at(cells, self.result).unwrap_or_else(placeholder),
            grade: text_at(cells, self.grade).unwrap_or_else(placeholder),
            attempt: "1".to_string(),
            passing_date: placeholder(),
        })
    }
}

fn placeholder() -> String {
    MISSING_TEXT.to_string()
}

/// Non-empty trimmed text of a cell.
fn text_at(cells: &[String], index: usize) -> Option<String> {
    cells
        .get(index)
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .map(str::to_string)
}

fn first_match<T>(
    cells: &[String],
    positions: &[usize],
    extract: impl Fn(&str) -> Option<T>,
) -> Option<T> {
    positions
        .iter()
        .filter_map(|&i| cells.get(i))
        .find_map(|cell| extract(cell))
}

/// Integer value of the leading digits of a cell, e.g. `"87 (P)"` is 87.
fn leading_int(cell: &str) -> Option<u32> {
    let digits: String = cell
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Parse one term's page with the default layout.
pub fn parse_term(markup: &str, term_number: u8) -> FetchedTerm {
    parse_term_with(markup, term_number, &RowLayout::default())
}

/// Parse one term's page. A page without usable rows yields an empty item
/// list, which callers treat as "not published yet".
pub fn parse_term_with(markup: &str, term_number: u8, layout: &RowLayout) -> FetchedTerm {
    let mut items = Vec::new();
    for table in all_elements(markup, "table") {
        for row in elements(table, "tr").into_iter().skip(1) {
            // A row wrapping another table is layout; the inner table is
            // visited on its own.
            if lower_ascii(row).contains("<table") {
                continue;
            }
            let cells: Vec<String> = elements(row, "td").into_iter().map(cell_text).collect();
            if let Some(item) = layout.extract(&cells) {
                items.push(item);
            }
        }
    }

    let average = provisional_average(&items);
    FetchedTerm {
        term_number,
        items,
        average,
    }
}

/// Credit-weighted grade-point over items with an in-range score, two
/// decimals. Scores above `MAX_TOTAL_SCORE` are ignored here as they are at
/// merge time.
fn provisional_average(items: &[FetchedItem]) -> Option<f64> {
    let scored: Vec<(u32, u8)> = items
        .iter()
        .filter_map(|i| {
            i.score
                .filter(|s| *s <= MAX_TOTAL_SCORE)
                .map(|s| (i.credits, grade_of(f64::from(s)).point()))
        })
        .collect();
    if scored.is_empty() {
        return None;
    }
    Some(round2(weighted_average(scored)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> String {
        let tds: String = cells.iter().map(|c| format!("<td>{c}</td>")).collect();
        format!("<tr>{tds}</tr>")
    }

    fn table(rows: &[String]) -> String {
        format!(
            "<table><tr><th>Code</th><th>Name</th><th>Marks</th></tr>{}</table>",
            rows.concat()
        )
    }

    #[test]
    fn short_row_is_dropped() {
        let html = table(&[
            row(&["CS101", "Programming in C", "91", "-", "4", "", "P", "O"]),
            row(&["CS102", "Data Structures"]),
        ]);

        let term = parse_term(&html, 1);

        assert_eq!(term.items.len(), 1);
        let item = &term.items[0];
        assert_eq!(item.code, "CS101");
        assert_eq!(item.score, Some(91));
        assert_eq!(item.credits, 4);
        assert_eq!(item.result, "P");
        assert_eq!(item.grade, "O");
        assert_eq!(item.attempt, "1");
        assert_eq!(item.passing_date, MISSING_TEXT);
    }

    #[test]
    fn first_row_is_a_header_even_with_td_cells() {
        let html = format!(
            "<table>{}{}</table>",
            row(&["Code", "Name", "Marks", "Extra"]),
            row(&["CS101", "Programming", "80", "x"])
        );
        let term = parse_term(&html, 2);
        assert_eq!(term.items.len(), 1);
        assert_eq!(term.items[0].code, "CS101");
    }

    #[test]
    fn score_and_credits_fall_back_to_second_position() {
        let html = table(&[row(&["CS201", "Algorithms", "AB", "72", "-", "3"])]);
        let item = &parse_term(&html, 2).items[0];
        assert_eq!(item.score, Some(72));
        assert_eq!(item.credits, 3);
        assert_eq!(item.result, MISSING_TEXT);
        assert_eq!(item.grade, MISSING_TEXT);
    }

    #[test]
    fn credits_default_when_unparseable_or_zero() {
        let html = table(&[
            row(&["CS301", "Compilers", "65", "", "n/a"]),
            row(&["CS302", "Networks", "55", "", "0", "0"]),
        ]);
        let term = parse_term(&html, 3);
        assert!(term.items.iter().all(|i| i.credits == 4));
    }

    #[test]
    fn blank_code_or_name_is_dropped() {
        let html = table(&[
            row(&["", "Orphan", "50", "x"]),
            row(&["CS401", "&nbsp;", "50", "x"]),
            row(&["CS402", "Cloud", "50", "x"]),
        ]);
        let term = parse_term(&html, 4);
        assert_eq!(term.items.len(), 1);
        assert_eq!(term.items[0].code, "CS402");
    }

    #[test]
    fn rows_from_every_table_are_collected() {
        let html = format!(
            "{}<p>between</p>{}",
            table(&[row(&["CS101", "A", "90", "-"])]),
            table(&[row(&["CS102", "B", "80", "-"])])
        );
        let codes: Vec<String> = parse_term(&html, 1)
            .items
            .into_iter()
            .map(|i| i.code)
            .collect();
        assert_eq!(codes, vec!["CS101", "CS102"]);
    }

    #[test]
    fn page_without_tables_is_empty_not_an_error() {
        let term = parse_term("<html><body>Results awaited</body></html>", 5);
        assert!(term.items.is_empty());
        assert_eq!(term.average, None);
    }

    #[test]
    fn average_unset_without_scores() {
        let html = table(&[row(&["CS101", "Programming", "-", "-"])]);
        let term = parse_term(&html, 1);
        assert_eq!(term.items.len(), 1);
        assert_eq!(term.average, None);
    }

    #[test]
    fn provisional_average_is_weighted_and_rounded() {
        let html = table(&[
            row(&["CS101", "A", "90", "", "4"]),
            row(&["CS102", "B", "83", "", "4"]),
            row(&["CS103", "C", "77", "", "4"]),
            row(&["CS104", "D", "65", "", "3"]),
            row(&["CS105", "Lab", "-", "", "2"]),
        ]);
        assert_eq!(parse_term(&html, 1).average, Some(8.6));

        let html = table(&[
            row(&["CS201", "A", "91", "", "3"]),
            row(&["CS202", "B", "85", "", "4"]),
        ]);
        // (3*10 + 4*9) / 7 = 9.428..
        assert_eq!(parse_term(&html, 2).average, Some(9.43));
    }

    #[test]
    fn custom_layout_reads_other_positions() {
        let layout = RowLayout {
            min_cells: 3,
            code: 1,
            name: 2,
            score: vec![0],
            credits: vec![],
            result: 9,
            grade: 9,
            default_credits: 2,
        };
        let html = table(&[row(&["88", "CS900", "Seminar"])]);
        let item = &parse_term_with(&html, 8, &layout).items[0];
        assert_eq!(item.code, "CS900");
        assert_eq!(item.score, Some(88));
        assert_eq!(item.credits, 2);
    }

    #[test]
    fn out_of_range_score_does_not_count_toward_average() {
        let html = table(&[
            row(&["CS101", "A", "72", "", "4"]),
            row(&["CS102", "B", "450", "", "4"]),
        ]);
        let term = parse_term(&html, 1);

        assert_eq!(term.items.len(), 2);
        assert_eq!(term.items[1].score, Some(450));
        assert_eq!(term.average, Some(8.0));
    }

    #[test]
    fn results_inside_a_layout_table_are_found() {
        let inner = table(&[
            row(&["CS101", "Programming", "91", "", "4"]),
            row(&["CS102", "Physics", "77", "", "3"]),
        ]);
        let html = format!(
            "<table><tr><td>Header banner</td></tr><tr><td>nav</td><td>{inner}</td></tr></table>"
        );

        let codes: Vec<String> = parse_term(&html, 1)
            .items
            .into_iter()
            .map(|i| i.code)
            .collect();
        assert_eq!(codes, vec!["CS101", "CS102"]);
    }

    #[test]
    fn rows_without_end_tags_are_parsed() {
        let html = "<table><tr><th>Code<th>Name<th>Marks\n\
                    <tr><td>CS101<td>Programming<td>91<td><td>4\n\
                    <tr><td>CS102<td>Physics<td>77<td><td>3\n\
                    </table>";
        let term = parse_term(html, 1);
        assert_eq!(term.items.len(), 2);
        assert_eq!(term.items[1].score, Some(77));
        assert_eq!(term.items[1].credits, 3);
    }
}
