#[derive(Clone, Copy, Debug)]
pub struct TableOptions {
    pub max_width: Option<usize>,
    pub color: bool,
}

const MIN_COLUMN: usize = 6;
const GAP: &str = "  ";

/// Plain-text table with aligned columns; numbers are right-aligned.
#[derive(Debug, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    #[must_use]
    pub const fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    #[must_use]
    pub fn render(&self, options: TableOptions) -> String {
        if self.rows.is_empty() {
            return String::from("(no rows)");
        }

        let widths = self.column_widths(options.max_width);
        let header = self
            .headers
            .iter()
            .zip(&widths)
            .map(|(text, &width)| pad(&truncate(text, width), width, false))
            .collect::<Vec<_>>()
            .join(GAP);

        let divider = "-".repeat(header.chars().count());
        let mut lines = Vec::with_capacity(self.rows.len() + 2);
        lines.push(header);
        lines.push(divider);

        for row in &self.rows {
            let line = widths
                .iter()
                .enumerate()
                .map(|(index, &width)| {
                    let text = truncate(row.get(index).map_or("-", String::as_str), width);
                    let numeric = is_numeric(&text);
                    let padded = pad(&text, width, numeric);
                    if options.color {
                        colorize(&padded, &text)
                    } else {
                        padded
                    }
                })
                .collect::<Vec<_>>()
                .join(GAP);
            lines.push(line);
        }
        lines.join("\n")
    }

    fn column_widths(&self, max_width: Option<usize>) -> Vec<usize> {
        let mut widths = self
            .headers
            .iter()
            .enumerate()
            .map(|(index, header)| {
                self.rows
                    .iter()
                    .filter_map(|row| row.get(index))
                    .map(|cell| cell.chars().count())
                    .chain([header.chars().count(), MIN_COLUMN])
                    .max()
                    .unwrap_or(MIN_COLUMN)
            })
            .collect::<Vec<_>>();

        let Some(max_width) = max_width else {
            return widths;
        };
        let gaps = widths.len().saturating_sub(1) * GAP.len();

        // Shave the widest column that is still above its floor until it fits.
        while widths.iter().sum::<usize>() + gaps > max_width {
            let widest = widths
                .iter()
                .enumerate()
                .filter(|&(index, &width)| width > self.headers[index].chars().count().max(MIN_COLUMN))
                .max_by_key(|&(_, &width)| width)
                .map(|(index, _)| index);
            let Some(index) = widest else { break };
            widths[index] -= 1;
        }
        widths
    }
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let mut out = value.chars().take(width.saturating_sub(1)).collect::<String>();
    out.push('…');
    out
}

fn pad(value: &str, width: usize, right_align: bool) -> String {
    if right_align {
        format!("{value:>width$}")
    } else {
        format!("{value:<width$}")
    }
}

fn is_numeric(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|ch| ch.is_ascii_digit() || ch == '.')
}

/// Highlight run modes and verdicts; `plain` is the unpadded cell text.
fn colorize(padded: &str, plain: &str) -> String {
    let code = match plain {
        "true" | "incremental" => "32",
        "full_build" => "33",
        "false" => "31",
        _ => return padded.to_string(),
    };
    format!("\u{1b}[{code}m{padded}\u{1b}[0m")
}

#[cfg(test)]
mod tests {
    use super::{Table, TableOptions};

    fn sample() -> Table {
        let mut table = Table::new(vec!["name".into(), "active".into()]);
        table.push(vec!["Eol Prou RS-T d3-94".into(), "1".into()]);
        table.push(vec!["Sol".into(), "12345".into()]);
        table
    }

    #[test]
    fn columns_align_and_numbers_right_align() {
        let out = sample().render(TableOptions {
            max_width: None,
            color: false,
        });
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[1].chars().all(|c| c == '-'));
        assert_eq!(lines[0].len(), lines[1].len());
        assert!(lines[2].ends_with("     1"));
        assert!(lines[3].ends_with(" 12345"));
    }

    #[test]
    fn narrow_terminal_truncates_the_widest_column() {
        let out = sample().render(TableOptions {
            max_width: Some(16),
            color: false,
        });
        let first_row = out.lines().nth(2).expect("row");
        assert!(first_row.contains('…'));
        assert_eq!(first_row.chars().count(), 16);
    }
}
