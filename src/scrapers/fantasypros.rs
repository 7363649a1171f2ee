use crate::models::{ScrapedAdp, ScrapedRank};
use crate::utils::names::clean_name;
use anyhow::{Context, Result};
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;

const URL_ECR_HALF_OVERALL: &str =
    "https://www.fantasypros.com/nfl/cheatsheets/top-half-ppr-players.php";
const URL_ADP_HALF_OVERALL: &str = "https://www.fantasypros.com/nfl/adp/half-point-ppr-overall.php";
const URL_BESTBALL_ADP: &str = "https://www.fantasypros.com/nfl/adp/best-ball-overall.php";

const FETCH_TIMEOUT: Duration = Duration::from_secs(20);

/// Per-site ADP columns averaged when a table has no average column
const ADP_SITE_COLUMNS: [&str; 7] = [
    "yahoo", "sleeper", "rtsports", "espn", "fdp", "bbm", "underdog",
];

pub struct FantasyProsScraper {
    client: reqwest::Client,
}

impl FantasyProsScraper {
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::builder()
                .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
                .timeout(FETCH_TIMEOUT)
                .build()
                .context("Failed to build FantasyPros HTTP client")?,
        })
    }

    async fn fetch_page(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", url))?;

        if !response.status().is_success() {
            anyhow::bail!("FantasyPros returned {} for {}", response.status(), url);
        }

        Ok(response.text().await?)
    }

    /// Expert consensus ranks from the half-PPR overall cheat sheet
    pub async fn fetch_ecr(&self) -> Result<Vec<ScrapedRank>> {
        let html = self.fetch_page(URL_ECR_HALF_OVERALL).await?;
        self.parse_ecr_html(&html)
    }

    /// Half-PPR consensus ADP
    pub async fn fetch_adp_half(&self) -> Result<Vec<ScrapedAdp>> {
        let html = self.fetch_page(URL_ADP_HALF_OVERALL).await?;
        self.parse_adp_html(&html)
    }

    /// Best-ball ADP, used as a stand-in for Underdog
    pub async fn fetch_bestball_adp(&self) -> Result<Vec<ScrapedAdp>> {
        let html = self.fetch_page(URL_BESTBALL_ADP).await?;
        self.parse_adp_html(&html)
    }

    /// The cheat sheet is an ordered list of "1. Player Name TEAM-POS"
    /// items. When no list item parses, fall back to the first table.
    pub fn parse_ecr_html(&self, html: &str) -> Result<Vec<ScrapedRank>> {
        let document = Html::parse_document(html);
        let li_selector = Selector::parse("ol li").ok().context("Invalid selector")?;

        let ranks: Vec<ScrapedRank> = document
            .select(&li_selector)
            .filter_map(|li| self.parse_ecr_line(&element_text(&li)))
            .collect();

        if !ranks.is_empty() {
            return Ok(ranks);
        }

        let table = parse_first_table(&document)?;
        let rank_col = table.column(&["Rank", "RK", "#"]).unwrap_or(0);
        let player_col = table.player_column();

        Ok(table
            .rows
            .iter()
            .filter_map(|row| {
                let ecr_rank = row.get(rank_col)?.text.trim().parse::<u32>().ok();
                let clean_name = row.get(player_col)?.player_name();
                (!clean_name.is_empty()).then_some(ScrapedRank {
                    clean_name,
                    ecr_rank,
                })
            })
            .collect())
    }

    fn parse_ecr_line(&self, line: &str) -> Option<ScrapedRank> {
        // "12. Ja'Marr Chase CIN-WR"
        let digits_end = line
            .char_indices()
            .find(|(_, c)| !c.is_ascii_digit())
            .map(|(i, _)| i)
            .unwrap_or(line.len());
        if digits_end == 0 {
            return None;
        }
        let ecr_rank = line[..digits_end].parse::<u32>().ok()?;

        let rest = &line[digits_end..];
        let rest = rest.strip_prefix('.').unwrap_or(rest);
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }

        let tokens: Vec<&str> = rest.split_whitespace().collect();
        let name_part = match tokens.len() {
            0 => return None,
            1 => tokens[0].to_string(),
            n => tokens[..n - 1].join(" "),
        };

        let clean_name = clean_name(&name_part);
        if clean_name.is_empty() {
            return None;
        }

        Some(ScrapedRank {
            clean_name,
            ecr_rank: Some(ecr_rank),
        })
    }

    /// First table on an ADP page. The value comes from the average column,
    /// or the mean of the per-site columns when there is none. Rows whose
    /// value is not numeric keep `adp: None`.
    pub fn parse_adp_html(&self, html: &str) -> Result<Vec<ScrapedAdp>> {
        let document = Html::parse_document(html);
        let table = parse_first_table(&document)?;
        let player_col = table.player_column();
        let avg_col = table.column(&["AVG", "Avg", "Average"]);
        let site_cols: Vec<usize> = table
            .headers
            .iter()
            .enumerate()
            .filter(|(_, h)| ADP_SITE_COLUMNS.contains(&h.to_lowercase().as_str()))
            .map(|(i, _)| i)
            .collect();

        Ok(table
            .rows
            .iter()
            .filter_map(|row| {
                let clean_name = row.get(player_col)?.player_name();
                if clean_name.is_empty() {
                    return None;
                }

                let adp = match avg_col {
                    Some(col) => row.get(col).and_then(|c| parse_number(&c.text)),
                    None => mean(site_cols.iter().filter_map(|&col| {
                        row.get(col).and_then(|c| parse_number(&c.text))
                    })),
                };

                Some(ScrapedAdp { clean_name, adp })
            })
            .collect())
    }
}

/// Cell of a scraped table
#[derive(Debug, Clone)]
struct Cell {
    text: String,
    link_text: Option<String>,
}

impl Cell {
    /// The player link when the cell has one, otherwise the text before the
    /// first run of two spaces (team and bye follow it)
    fn player_name(&self) -> String {
        match &self.link_text {
            Some(link) => clean_name(link),
            None => clean_name(self.text.split("  ").next().unwrap_or_default()),
        }
    }
}

struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    fn column(&self, names: &[&str]) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| names.iter().any(|n| h == n))
    }

    fn player_column(&self) -> usize {
        self.column(&["Player Team (Bye)"])
            .or_else(|| self.column(&["Player"]))
            .unwrap_or(1)
    }
}

fn parse_first_table(document: &Html) -> Result<Table> {
    let table_selector = Selector::parse("table").ok().context("Invalid selector")?;
    let head_selector = Selector::parse("thead th").ok().context("Invalid selector")?;
    let body_row_selector = Selector::parse("tbody tr").ok().context("Invalid selector")?;
    let row_selector = Selector::parse("tr").ok().context("Invalid selector")?;
    let cell_selector = Selector::parse("th, td").ok().context("Invalid selector")?;
    let link_selector = Selector::parse("a").ok().context("Invalid selector")?;

    let table = document
        .select(&table_selector)
        .next()
        .context("No table found on page")?;

    let read_cells = |row: ElementRef| -> Vec<Cell> {
        row.select(&cell_selector)
            .map(|cell| Cell {
                text: cell.text().collect::<String>(),
                link_text: cell
                    .select(&link_selector)
                    .next()
                    .map(|a| element_text(&a))
                    .filter(|t| !t.is_empty()),
            })
            .collect()
    };

    let mut headers: Vec<String> = table.select(&head_selector).map(|th| element_text(&th)).collect();
    let mut rows: Vec<Vec<Cell>> = table.select(&body_row_selector).map(read_cells).collect();

    if headers.is_empty() || rows.is_empty() {
        let mut all_rows = table.select(&row_selector);
        headers = all_rows
            .next()
            .map(|tr| read_cells(tr).into_iter().map(|c| c.text.trim().to_string()).collect())
            .unwrap_or_default();
        rows = all_rows.map(read_cells).collect();
    }

    Ok(Table { headers, rows })
}

/// Text content with each text node trimmed and joined by single spaces
fn element_text(element: &ElementRef) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_number(text: &str) -> Option<f64> {
    text.trim()
        .replace(',', "")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    (count > 0).then(|| sum / count as f64)
}
