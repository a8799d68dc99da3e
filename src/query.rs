//! Task list filtering, ordering and pagination.
//!
//! The HTTP layer parses query-string values into a [`TaskQuery`] and hands
//! it, together with the caller's tasks and today's date, to [`run`]. All
//! filtering happens here, in memory, so the whole listing pipeline is
//! testable without a live database.

use chrono::{Days, NaiveDate};

use crate::models::{Priority, Task};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DueFilter {
    #[default]
    All,
    Today,
    Upcoming,
    Overdue,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    /// Tasks without a category.
    None,
    /// Case-insensitive exact match.
    Is(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    CreatedAt,
    DueDate,
    Priority,
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Everything the list view needs to know about how to slice the task set.
///
/// Parsing from query-string values is lenient: unknown values fall back to
/// the field's default, matching how the HTTP form degrades.
#[derive(Debug, Clone, Default)]
pub struct TaskQuery {
    pub search: Option<String>,
    pub status: StatusFilter,
    pub priority: Option<Priority>,
    pub due: DueFilter,
    pub category: CategoryFilter,
    pub sort: SortKey,
    pub order: SortOrder,
    pub page: usize,
}

impl StatusFilter {
    pub fn parse(value: &str) -> Self {
        match value {
            "pending" => StatusFilter::Pending,
            "completed" => StatusFilter::Completed,
            _ => StatusFilter::All,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::Pending => "pending",
            StatusFilter::Completed => "completed",
        }
    }
}

impl DueFilter {
    pub fn parse(value: &str) -> Self {
        match value {
            "today" => DueFilter::Today,
            "upcoming" => DueFilter::Upcoming,
            "overdue" => DueFilter::Overdue,
            _ => DueFilter::All,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DueFilter::All => "all",
            DueFilter::Today => "today",
            DueFilter::Upcoming => "upcoming",
            DueFilter::Overdue => "overdue",
        }
    }
}

impl CategoryFilter {
    pub fn parse(value: &str) -> Self {
        match value {
            "all" | "" => CategoryFilter::All,
            "none" => CategoryFilter::None,
            other => CategoryFilter::Is(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            CategoryFilter::All => "all",
            CategoryFilter::None => "none",
            CategoryFilter::Is(value) => value,
        }
    }
}

impl SortKey {
    pub fn parse(value: &str) -> Self {
        match value {
            "due_date" => SortKey::DueDate,
            "priority" => SortKey::Priority,
            "status" => SortKey::Status,
            _ => SortKey::CreatedAt,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::CreatedAt => "created_at",
            SortKey::DueDate => "due_date",
            SortKey::Priority => "priority",
            SortKey::Status => "status",
        }
    }
}

impl SortOrder {
    pub fn parse(value: &str) -> Self {
        match value {
            "asc" => SortOrder::Asc,
            _ => SortOrder::Desc,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl TaskQuery {
    /// Lenient parse of an invalid priority degrades to "all priorities".
    pub fn parse_priority(value: &str) -> Option<Priority> {
        if value == "all" || value.is_empty() {
            return None;
        }
        value.parse().ok()
    }
}

/// A single page of the filtered, ordered result set.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub per_page: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

fn matches(task: &Task, query: &TaskQuery, today: NaiveDate) -> bool {
    if let Some(search) = &query.search {
        let needle = search.to_lowercase();
        if !needle.is_empty() && !task.description.to_lowercase().contains(&needle) {
            return false;
        }
    }

    match query.status {
        StatusFilter::All => {}
        StatusFilter::Pending => {
            if task.completed {
                return false;
            }
        }
        StatusFilter::Completed => {
            if !task.completed {
                return false;
            }
        }
    }

    if let Some(priority) = query.priority {
        if task.priority != priority {
            return false;
        }
    }

    // Tasks without a due date never match a bucket. The upcoming window
    // includes today; upcoming and overdue exclude completed tasks.
    match query.due {
        DueFilter::All => {}
        DueFilter::Today => {
            if task.due_date != Some(today) {
                return false;
            }
        }
        DueFilter::Upcoming => {
            let horizon = today + Days::new(7);
            match task.due_date {
                Some(due) if due >= today && due <= horizon && !task.completed => {}
                _ => return false,
            }
        }
        DueFilter::Overdue => match task.due_date {
            Some(due) if due < today && !task.completed => {}
            _ => return false,
        },
    }

    match &query.category {
        CategoryFilter::All => true,
        CategoryFilter::None => task.category.is_none(),
        CategoryFilter::Is(wanted) => task
            .category
            .as_deref()
            .is_some_and(|c| c.eq_ignore_ascii_case(wanted)),
    }
}

fn sort_tasks(tasks: &mut [Task], sort: SortKey, order: SortOrder) {
    match sort {
        // Ids break creation-time ties so the order is stable even when
        // two tasks share a timestamp.
        SortKey::CreatedAt => tasks.sort_by(|a, b| {
            let cmp = (a.created_at, a.id).cmp(&(b.created_at, b.id));
            match order {
                SortOrder::Asc => cmp,
                SortOrder::Desc => cmp.reverse(),
            }
        }),
        // Absent due dates order after all present ones regardless of
        // direction, so only the Some/Some comparison is reversed.
        SortKey::DueDate => tasks.sort_by(|a, b| match (a.due_date, b.due_date) {
            (Some(x), Some(y)) => match order {
                SortOrder::Asc => x.cmp(&y),
                SortOrder::Desc => y.cmp(&x),
            },
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        }),
        SortKey::Priority => tasks.sort_by(|a, b| {
            let cmp = a.priority.rank().cmp(&b.priority.rank());
            match order {
                SortOrder::Asc => cmp,
                SortOrder::Desc => cmp.reverse(),
            }
        }),
        SortKey::Status => tasks.sort_by(|a, b| {
            let cmp = a.completed.cmp(&b.completed);
            match order {
                SortOrder::Asc => cmp,
                SortOrder::Desc => cmp.reverse(),
            }
        }),
    }
}

/// Apply a [`TaskQuery`] to a task set: filter, sort (stable), paginate.
///
/// Page numbers start at 1. A page past the end yields an empty item list
/// while still reporting the correct totals, so the view can offer a way
/// back instead of erroring.
pub fn run(tasks: Vec<Task>, query: &TaskQuery, today: NaiveDate, per_page: usize) -> Page<Task> {
    let mut filtered: Vec<Task> = tasks
        .into_iter()
        .filter(|task| matches(task, query, today))
        .collect();

    sort_tasks(&mut filtered, query.sort, query.order);

    let per_page = per_page.max(1);
    let total_items = filtered.len();
    let total_pages = total_items.div_ceil(per_page);
    let page = query.page.max(1);

    // Saturating: the page number comes straight off the query string.
    let items = filtered
        .into_iter()
        .skip((page - 1).saturating_mul(per_page))
        .take(per_page)
        .collect();

    Page {
        items,
        page,
        per_page,
        total_items,
        total_pages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    struct TaskSpec {
        description: &'static str,
        completed: bool,
        priority: Priority,
        due: Option<NaiveDate>,
        category: Option<&'static str>,
    }

    impl Default for TaskSpec {
        fn default() -> Self {
            Self {
                description: "task",
                completed: false,
                priority: Priority::Media,
                due: None,
                category: None,
            }
        }
    }

    fn build(specs: Vec<TaskSpec>) -> Vec<Task> {
        specs
            .into_iter()
            .enumerate()
            .map(|(i, spec)| Task {
                id: Some(i as i64 + 1),
                description: spec.description.to_string(),
                completed: spec.completed,
                // Later tasks get later creation times.
                created_at: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, i as u32).unwrap(),
                priority: spec.priority,
                due_date: spec.due,
                category: spec.category.map(str::to_string),
                user_id: 1,
            })
            .collect()
    }

    fn descriptions(page: &Page<Task>) -> Vec<&str> {
        page.items.iter().map(|t| t.description.as_str()).collect()
    }

    #[test]
    fn default_query_sorts_newest_first() {
        let tasks = build(vec![
            TaskSpec { description: "first", ..Default::default() },
            TaskSpec { description: "second", ..Default::default() },
        ]);
        let page = run(tasks, &TaskQuery::default(), today(), 5);
        assert_eq!(descriptions(&page), vec!["second", "first"]);
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let tasks = build(vec![
            TaskSpec { description: "Buy Milk", ..Default::default() },
            TaskSpec { description: "send invoice", ..Default::default() },
        ]);
        let query = TaskQuery { search: Some("MILK".to_string()), ..Default::default() };
        let page = run(tasks, &query, today(), 5);
        assert_eq!(descriptions(&page), vec!["Buy Milk"]);
    }

    #[test]
    fn status_filter_completed_returns_only_completed() {
        let tasks = build(vec![
            TaskSpec { description: "open", ..Default::default() },
            TaskSpec { description: "done", completed: true, ..Default::default() },
        ]);
        let query = TaskQuery { status: StatusFilter::Completed, ..Default::default() };
        let page = run(tasks, &query, today(), 5);
        assert_eq!(descriptions(&page), vec!["done"]);
    }

    #[test]
    fn priority_and_status_filters_combine() {
        let tasks = build(vec![
            TaskSpec { description: "alta pending", priority: Priority::Alta, ..Default::default() },
            TaskSpec {
                description: "alta done",
                priority: Priority::Alta,
                completed: true,
                ..Default::default()
            },
            TaskSpec { description: "media pending", ..Default::default() },
        ]);
        let query = TaskQuery {
            status: StatusFilter::Pending,
            priority: Some(Priority::Alta),
            ..Default::default()
        };
        let page = run(tasks, &query, today(), 5);
        assert_eq!(descriptions(&page), vec!["alta pending"]);
    }

    #[test]
    fn due_buckets_exclude_what_they_should() {
        let tasks = build(vec![
            TaskSpec { description: "due today", due: Some(today()), ..Default::default() },
            TaskSpec {
                description: "due tomorrow",
                due: today().succ_opt(),
                ..Default::default()
            },
            TaskSpec {
                description: "due next month",
                due: NaiveDate::from_ymd_opt(2025, 4, 20),
                ..Default::default()
            },
            TaskSpec {
                description: "late",
                due: NaiveDate::from_ymd_opt(2025, 3, 1),
                ..Default::default()
            },
            TaskSpec {
                description: "late but done",
                due: NaiveDate::from_ymd_opt(2025, 3, 1),
                completed: true,
                ..Default::default()
            },
            TaskSpec { description: "undated", ..Default::default() },
        ]);

        let q = |due| TaskQuery { due, order: SortOrder::Asc, ..Default::default() };

        let page = run(tasks.clone(), &q(DueFilter::Today), today(), 10);
        assert_eq!(descriptions(&page), vec!["due today"]);

        // Upcoming includes today and stops 7 days out.
        let page = run(tasks.clone(), &q(DueFilter::Upcoming), today(), 10);
        assert_eq!(descriptions(&page), vec!["due today", "due tomorrow"]);

        let page = run(tasks, &q(DueFilter::Overdue), today(), 10);
        assert_eq!(descriptions(&page), vec!["late"]);
    }

    #[test]
    fn category_filter_variants() {
        let tasks = build(vec![
            TaskSpec { description: "work a", category: Some("Work"), ..Default::default() },
            TaskSpec { description: "home a", category: Some("home"), ..Default::default() },
            TaskSpec { description: "loose", ..Default::default() },
        ]);

        let query = TaskQuery {
            category: CategoryFilter::Is("work".to_string()),
            ..Default::default()
        };
        let page = run(tasks.clone(), &query, today(), 5);
        assert_eq!(descriptions(&page), vec!["work a"]);

        let query = TaskQuery { category: CategoryFilter::None, ..Default::default() };
        let page = run(tasks, &query, today(), 5);
        assert_eq!(descriptions(&page), vec!["loose"]);
    }

    #[test]
    fn priority_sort_uses_rank_not_lexical_order() {
        // Lexically "Alta" < "Baixa" < "Média"; rank order must win.
        let tasks = build(vec![
            TaskSpec { description: "low", priority: Priority::Baixa, ..Default::default() },
            TaskSpec { description: "high", priority: Priority::Alta, ..Default::default() },
            TaskSpec { description: "mid", ..Default::default() },
        ]);
        let query = TaskQuery { sort: SortKey::Priority, ..Default::default() };
        let page = run(tasks, &query, today(), 5);
        assert_eq!(descriptions(&page), vec!["high", "mid", "low"]);
    }

    #[test]
    fn missing_due_dates_sort_last_in_both_directions() {
        let tasks = build(vec![
            TaskSpec { description: "undated", ..Default::default() },
            TaskSpec {
                description: "march",
                due: NaiveDate::from_ymd_opt(2025, 3, 5),
                ..Default::default()
            },
            TaskSpec {
                description: "april",
                due: NaiveDate::from_ymd_opt(2025, 4, 5),
                ..Default::default()
            },
        ]);

        let query = TaskQuery {
            sort: SortKey::DueDate,
            order: SortOrder::Asc,
            ..Default::default()
        };
        let page = run(tasks.clone(), &query, today(), 5);
        assert_eq!(descriptions(&page), vec!["march", "april", "undated"]);

        let query = TaskQuery {
            sort: SortKey::DueDate,
            order: SortOrder::Desc,
            ..Default::default()
        };
        let page = run(tasks, &query, today(), 5);
        assert_eq!(descriptions(&page), vec!["april", "march", "undated"]);
    }

    #[test]
    fn status_sort_groups_by_completion() {
        let tasks = build(vec![
            TaskSpec { description: "done", completed: true, ..Default::default() },
            TaskSpec { description: "open", ..Default::default() },
        ]);
        let query = TaskQuery {
            sort: SortKey::Status,
            order: SortOrder::Asc,
            ..Default::default()
        };
        let page = run(tasks, &query, today(), 5);
        assert_eq!(descriptions(&page), vec!["open", "done"]);
    }

    #[test]
    fn pagination_slices_and_reports_totals() {
        let tasks = build(
            (0..12)
                .map(|_| TaskSpec::default())
                .collect::<Vec<_>>(),
        );
        let query = TaskQuery { page: 3, order: SortOrder::Asc, ..Default::default() };
        let page = run(tasks, &query, today(), 5);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total_items, 12);
        assert_eq!(page.total_pages, 3);
        assert!(page.has_prev());
        assert!(!page.has_next());
    }

    #[test]
    fn page_past_the_end_is_empty_but_keeps_totals() {
        let tasks = build(vec![TaskSpec::default(), TaskSpec::default()]);
        let query = TaskQuery { page: 9, ..Default::default() };
        let page = run(tasks, &query, today(), 5);
        assert!(page.items.is_empty());
        assert_eq!(page.total_items, 2);
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn absurdly_large_page_numbers_do_not_overflow() {
        let tasks = build(vec![TaskSpec::default(), TaskSpec::default()]);
        let query = TaskQuery { page: usize::MAX, ..Default::default() };
        let page = run(tasks, &query, today(), 5);
        assert!(page.items.is_empty());
        assert_eq!(page.total_items, 2);
    }

    #[test]
    fn lenient_parsing_falls_back_to_defaults() {
        assert_eq!(StatusFilter::parse("nonsense"), StatusFilter::All);
        assert_eq!(DueFilter::parse("later"), DueFilter::All);
        assert_eq!(SortKey::parse("id"), SortKey::CreatedAt);
        assert_eq!(SortOrder::parse("sideways"), SortOrder::Desc);
        assert_eq!(TaskQuery::parse_priority("Urgent"), None);
        assert_eq!(TaskQuery::parse_priority("Alta"), Some(Priority::Alta));
        assert_eq!(CategoryFilter::parse("none"), CategoryFilter::None);
    }
}
