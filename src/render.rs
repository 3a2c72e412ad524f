//! Publication list rendering.
//!
//! Orders normalized records, keeps the ones that belong on the current page
//! and turns each into a self-contained HTML card.

use crate::classify::Category;
use crate::normalize::{html_escape, NormalizedRecord, NULL_LINK};
use serde::Serialize;
use std::cmp::Ordering;

/// Class carried by every card element and by nothing else
pub const CARD_CLASS: &str = "pub-card";

/// Text of the empty-state message
pub const EMPTY_MESSAGE: &str = "No publications to display yet.";

/// Year, then month, newest first; ties broken by title ascending.
pub fn compare_records(a: &NormalizedRecord, b: &NormalizedRecord) -> Ordering {
    b.year
        .cmp(&a.year)
        .then_with(|| b.month.cmp(&a.month))
        .then_with(|| a.title.cmp(&b.title))
}

/// Stable sort in display order
pub fn sort_records(records: &mut [NormalizedRecord]) {
    records.sort_by(compare_records);
}

/// Keep records whose `author_id` equals the page token, or all of them when
/// the page has no token.
pub fn filter_identity(records: Vec<NormalizedRecord>, token: Option<&str>) -> Vec<NormalizedRecord> {
    let Some(token) = token.map(str::trim).filter(|t| !t.is_empty()) else {
        return records;
    };
    records
        .into_iter()
        .filter(|r| r.author_id.as_deref().map(str::trim) == Some(token))
        .collect()
}

pub fn filter_category(records: Vec<NormalizedRecord>, category: Category) -> Vec<NormalizedRecord> {
    records.into_iter().filter(|r| r.category == category).collect()
}

/// One rendered publication
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayCard {
    pub label: String,
    pub category: Category,
    pub date: String,
    pub venue: String,
    pub title: String,
    pub authors_markup: String,
    pub href: String,
    pub details: String,
    /// Present only for cited publications
    pub citation_badge: Option<String>,
}

impl DisplayCard {
    pub fn from_record(record: &NormalizedRecord) -> Self {
        Self {
            label: record.category.label().to_string(),
            category: record.category,
            date: record.date.clone(),
            venue: record.venue.clone(),
            title: record.title.clone(),
            authors_markup: record.authors_markup.clone(),
            href: record.href.clone(),
            details: record.details.clone(),
            citation_badge: (record.citations > 0).then(|| format!("Cited by {}", record.citations)),
        }
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "<article class=\"{} {}--{}\">\n",
            CARD_CLASS,
            CARD_CLASS,
            self.category.as_str()
        ));

        out.push_str("<div class=\"pub-meta\">");
        out.push_str(&format!(
            "<span class=\"pub-label\">{}</span>",
            html_escape(&self.label)
        ));
        if !self.date.is_empty() {
            out.push_str(&format!(
                "<span class=\"pub-date\">{}</span>",
                html_escape(&self.date)
            ));
        }
        out.push_str("</div>\n");

        if self.href == NULL_LINK {
            out.push_str(&format!(
                "<h3 class=\"pub-title\"><a href=\"{}\">{}</a></h3>\n",
                NULL_LINK,
                html_escape(&self.title)
            ));
        } else {
            out.push_str(&format!(
                "<h3 class=\"pub-title\"><a href=\"{}\" target=\"_blank\" rel=\"noopener\">{}</a></h3>\n",
                html_escape(&self.href),
                html_escape(&self.title)
            ));
        }

        if !self.authors_markup.is_empty() {
            // Already escaped by the highlighter.
            out.push_str(&format!(
                "<p class=\"pub-authors\">{}</p>\n",
                self.authors_markup
            ));
        }

        if !self.venue.is_empty() || !self.details.is_empty() {
            out.push_str("<p class=\"pub-venue\">");
            out.push_str(&html_escape(&self.venue));
            if !self.details.is_empty() {
                out.push_str(&format!(
                    "<span class=\"pub-details\">{}</span>",
                    html_escape(&self.details)
                ));
            }
            out.push_str("</p>\n");
        }

        if let Some(badge) = &self.citation_badge {
            out.push_str(&format!(
                "<span class=\"pub-cites\">{}</span>\n",
                html_escape(badge)
            ));
        }

        out.push_str("</article>\n");
        out
    }
}

/// Empty-state message; never carries the card class
pub fn empty_state_html() -> String {
    format!(
        "<p class=\"pub-empty\" role=\"status\">{}</p>\n",
        EMPTY_MESSAGE
    )
}

/// Rendered list content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRendering {
    pub cards: Vec<DisplayCard>,
    pub html: String,
}

/// Build one card per record, in the given order.
pub fn render_list(records: &[NormalizedRecord]) -> ListRendering {
    let cards: Vec<DisplayCard> = records.iter().map(DisplayCard::from_record).collect();

    let html = if cards.is_empty() {
        empty_state_html()
    } else {
        cards.iter().map(DisplayCard::to_html).collect()
    };

    ListRendering { cards, html }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    fn rec(year: i64, month: i64, title: &str) -> NormalizedRecord {
        NormalizedRecord {
            title: title.to_string(),
            venue: String::new(),
            date: String::new(),
            href: NULL_LINK.to_string(),
            authors_markup: String::new(),
            citations: 0,
            year,
            month,
            category: Category::Article,
            author_id: None,
            details: String::new(),
            doi_url: None,
            scopus_url: None,
        }
    }

    fn titles(records: &[NormalizedRecord]) -> Vec<String> {
        records.iter().map(|r| format!("{}/{}", r.year, r.title)).collect()
    }

    #[test]
    fn test_sort_order() {
        let mut records = vec![rec(2023, 0, "B"), rec(2023, 0, "A"), rec(2024, 0, "Z")];
        sort_records(&mut records);
        assert_eq!(titles(&records), vec!["2024/Z", "2023/A", "2023/B"]);
    }

    #[test]
    fn test_sort_month_and_unknown_last() {
        let mut records = vec![
            rec(0, 0, "Undated"),
            rec(2022, 3, "March"),
            rec(2022, 11, "November"),
            rec(2022, 0, "NoMonth"),
        ];
        sort_records(&mut records);
        let order: Vec<&str> = records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(order, vec!["November", "March", "NoMonth", "Undated"]);
    }

    #[test]
    fn test_title_tiebreak_is_case_sensitive() {
        let mut records = vec![rec(2020, 1, "apple"), rec(2020, 1, "Banana")];
        sort_records(&mut records);
        assert_eq!(records[0].title, "Banana");
    }

    #[test]
    fn test_filter_identity() {
        let mut mine = rec(2020, 0, "Mine");
        mine.author_id = Some("42".to_string());
        let mut theirs = rec(2020, 0, "Theirs");
        theirs.author_id = Some("7".to_string());
        let records = vec![mine, theirs, rec(2020, 0, "Unknown")];

        assert_eq!(filter_identity(records.clone(), None).len(), 3);
        assert_eq!(filter_identity(records.clone(), Some("  ")).len(), 3);
        let kept = filter_identity(records, Some(" 42 "));
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].title, "Mine");
    }

    #[test]
    fn test_filter_category() {
        let mut conf = rec(2020, 0, "Conf");
        conf.category = Category::Conference;
        let kept = filter_category(vec![conf, rec(2021, 0, "Art")], Category::Conference);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].title, "Conf");
    }

    #[test]
    fn test_card_badge_only_when_cited() {
        let mut r = rec(2020, 0, "T");
        assert_eq!(DisplayCard::from_record(&r).citation_badge, None);
        r.citations = 3;
        assert_eq!(
            DisplayCard::from_record(&r).citation_badge.as_deref(),
            Some("Cited by 3")
        );
    }

    #[test]
    fn test_card_html_escapes_fields() {
        let mut r = rec(2020, 0, "Rocks & <Slopes>");
        r.href = "https://doi.org/10.1/a\"b".to_string();
        r.venue = "Géotechnique".to_string();
        let html = DisplayCard::from_record(&r).to_html();
        assert!(html.contains("Rocks &amp; &lt;Slopes&gt;"));
        assert!(html.contains("href=\"https://doi.org/10.1/a&quot;b\""));
        assert!(html.contains("Géotechnique"));
    }

    #[test]
    fn test_render_list_order_and_count() {
        let records = vec![rec(2024, 0, "First"), rec(2023, 0, "Second")];
        let rendering = render_list(&records);
        let document = Html::parse_fragment(&rendering.html);
        let selector = Selector::parse("article.pub-card h3 a").expect("selector");
        let found: Vec<String> = document
            .select(&selector)
            .map(|a| a.text().collect::<String>())
            .collect();
        assert_eq!(found, vec!["First", "Second"]);
        assert_eq!(rendering.cards.len(), 2);
    }

    #[test]
    fn test_empty_state_is_not_a_card() {
        let rendering = render_list(&[]);
        assert!(rendering.cards.is_empty());
        let document = Html::parse_fragment(&rendering.html);
        let cards = Selector::parse(".pub-card").expect("selector");
        let empty = Selector::parse("p.pub-empty").expect("selector");
        assert_eq!(document.select(&cards).count(), 0);
        assert_eq!(document.select(&empty).count(), 1);
    }
}
