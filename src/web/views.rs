//! Minimal server-side HTML rendering. Deliberately plain: a layout shell,
//! three pages, and the escaping required to put user text in them.

use axum::response::Html;
use chrono::NaiveDate;
use std::fmt::Write;

use crate::models::{Priority, Task, User};
use crate::query::{CategoryFilter, Page, TaskQuery};
use crate::utils::{format_date, format_datetime};
use crate::web::flash::Flash;

/// Escape text for an HTML context
pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Percent-encode a query-string value
fn urlencode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            b' ' => out.push_str("%20"),
            other => {
                let _ = write!(out, "%{other:02X}");
            }
        }
    }
    out
}

fn layout(title: &str, flash: Option<Flash>, body: &str) -> Html<String> {
    let flash_html = match flash {
        Some(flash) => format!(
            "<p class=\"flash flash-{}\">{}</p>",
            flash.level.as_str(),
            escape(&flash.message)
        ),
        None => String::new(),
    };
    Html(format!(
        "<!DOCTYPE html>\n<html lang=\"pt-BR\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title} - Tarefas</title>\n</head>\n<body>\n<h1>{title}</h1>\n\
         {flash_html}\n{body}\n</body>\n</html>\n"
    ))
}

pub fn login_page(flash: Option<Flash>) -> Html<String> {
    layout(
        "Login",
        flash,
        "<form method=\"post\" action=\"/login\">\n\
         <label>Nome de usuário <input type=\"text\" name=\"username\"></label>\n\
         <label>Senha <input type=\"password\" name=\"password\"></label>\n\
         <button type=\"submit\">Entrar</button>\n\
         </form>\n\
         <p><a href=\"/register\">Criar uma conta</a></p>",
    )
}

pub fn register_page(flash: Option<Flash>) -> Html<String> {
    layout(
        "Registrar",
        flash,
        "<form method=\"post\" action=\"/register\">\n\
         <label>Nome de usuário <input type=\"text\" name=\"username\"></label>\n\
         <label>Email <input type=\"email\" name=\"email\"></label>\n\
         <label>Senha <input type=\"password\" name=\"password\"></label>\n\
         <label>Confirmar senha <input type=\"password\" name=\"confirm_password\"></label>\n\
         <button type=\"submit\">Registrar</button>\n\
         </form>\n\
         <p><a href=\"/login\">Já tenho conta</a></p>",
    )
}

fn selected(condition: bool) -> &'static str {
    if condition { " selected" } else { "" }
}

fn priority_options(current: Option<Priority>) -> String {
    let mut out = String::new();
    for priority in Priority::ALL {
        let _ = write!(
            out,
            "<option value=\"{}\"{}>{}</option>",
            priority.as_str(),
            selected(current == Some(priority)),
            priority.as_str()
        );
    }
    out
}

/// Query string for a given page, preserving every active filter
fn page_href(query: &TaskQuery, page: usize) -> String {
    let mut href = format!(
        "/?page={page}&status_filter={}&due_date_filter={}&sort_by={}&order={}",
        query.status.as_str(),
        query.due.as_str(),
        query.sort.as_str(),
        query.order.as_str()
    );
    if let Some(search) = &query.search {
        let _ = write!(href, "&search_query={}", urlencode(search));
    }
    if let Some(priority) = query.priority {
        let _ = write!(href, "&priority_filter={}", urlencode(priority.as_str()));
    }
    if query.category != CategoryFilter::All {
        let _ = write!(href, "&category_filter={}", urlencode(query.category.as_str()));
    }
    href
}

fn filter_form(query: &TaskQuery, categories: &[String]) -> String {
    let mut category_options = format!(
        "<option value=\"all\"{}>Todas</option><option value=\"none\"{}>Sem categoria</option>",
        selected(query.category == CategoryFilter::All),
        selected(query.category == CategoryFilter::None)
    );
    for category in categories {
        let is_current = matches!(&query.category, CategoryFilter::Is(c) if c.eq_ignore_ascii_case(category));
        let _ = write!(
            category_options,
            "<option value=\"{}\"{}>{}</option>",
            escape(category),
            selected(is_current),
            escape(category)
        );
    }

    let status = query.status.as_str();
    let due = query.due.as_str();
    let sort = query.sort.as_str();
    let order = query.order.as_str();

    format!(
        "<form method=\"get\" action=\"/\" class=\"filters\">\n\
         <input type=\"text\" name=\"search_query\" placeholder=\"Buscar...\" value=\"{search}\">\n\
         <select name=\"status_filter\">\
         <option value=\"all\"{s_all}>Todas</option>\
         <option value=\"pending\"{s_pending}>Pendentes</option>\
         <option value=\"completed\"{s_completed}>Concluídas</option>\
         </select>\n\
         <select name=\"priority_filter\">\
         <option value=\"all\"{p_all}>Todas as prioridades</option>{p_opts}\
         </select>\n\
         <select name=\"due_date_filter\">\
         <option value=\"all\"{d_all}>Qualquer data</option>\
         <option value=\"today\"{d_today}>Hoje</option>\
         <option value=\"upcoming\"{d_upcoming}>Próximos 7 dias</option>\
         <option value=\"overdue\"{d_overdue}>Atrasadas</option>\
         </select>\n\
         <select name=\"category_filter\">{c_opts}</select>\n\
         <select name=\"sort_by\">\
         <option value=\"created_at\"{k_created}>Data de criação</option>\
         <option value=\"due_date\"{k_due}>Data de vencimento</option>\
         <option value=\"priority\"{k_priority}>Prioridade</option>\
         <option value=\"status\"{k_status}>Status</option>\
         </select>\n\
         <select name=\"order\">\
         <option value=\"desc\"{o_desc}>Decrescente</option>\
         <option value=\"asc\"{o_asc}>Crescente</option>\
         </select>\n\
         <button type=\"submit\">Filtrar</button>\n\
         </form>",
        search = escape(query.search.as_deref().unwrap_or("")),
        s_all = selected(status == "all"),
        s_pending = selected(status == "pending"),
        s_completed = selected(status == "completed"),
        p_all = selected(query.priority.is_none()),
        p_opts = priority_options(query.priority),
        d_all = selected(due == "all"),
        d_today = selected(due == "today"),
        d_upcoming = selected(due == "upcoming"),
        d_overdue = selected(due == "overdue"),
        c_opts = category_options,
        k_created = selected(sort == "created_at"),
        k_due = selected(sort == "due_date"),
        k_priority = selected(sort == "priority"),
        k_status = selected(sort == "status"),
        o_desc = selected(order == "desc"),
        o_asc = selected(order == "asc"),
    )
}

fn create_form() -> String {
    format!(
        "<form method=\"post\" action=\"/create\" class=\"create\">\n\
         <input type=\"text\" name=\"description\" placeholder=\"Nova tarefa\" required maxlength=\"200\">\n\
         <select name=\"priority\">{}</select>\n\
         <input type=\"date\" name=\"due_date\">\n\
         <input type=\"text\" name=\"category\" placeholder=\"Categoria\">\n\
         <button type=\"submit\">Criar</button>\n\
         </form>",
        priority_options(Some(Priority::default()))
    )
}

fn task_row(task: &Task, today: NaiveDate, utc_offset_minutes: i32) -> String {
    let id = task.id.unwrap_or_default();
    let overdue = !task.completed && task.due_date.is_some_and(|due| due < today);
    let mut classes = vec!["task"];
    if task.completed {
        classes.push("completed");
    }
    if overdue {
        classes.push("overdue");
    }

    format!(
        "<li class=\"{classes}\">\n\
         <span class=\"description\">{description}</span>\n\
         <span class=\"priority\">{priority}</span>\n\
         <span class=\"due\">{due}</span>\n\
         <span class=\"category\">{category}</span>\n\
         <span class=\"created\">{created}</span>\n\
         <form method=\"post\" action=\"/complete/{id}\"><button type=\"submit\">{toggle}</button></form>\n\
         <form method=\"post\" action=\"/update/{id}\">\n\
         <input type=\"text\" name=\"description\" value=\"{description}\" required maxlength=\"200\">\n\
         <select name=\"priority\">{p_opts}</select>\n\
         <input type=\"date\" name=\"due_date\" value=\"{due_iso}\">\n\
         <input type=\"text\" name=\"category\" value=\"{category_raw}\">\n\
         <button type=\"submit\">Salvar</button>\n\
         </form>\n\
         <form method=\"post\" action=\"/delete/{id}\"><button type=\"submit\">Excluir</button></form>\n\
         </li>",
        classes = classes.join(" "),
        description = escape(&task.description),
        priority = task.priority.as_str(),
        due = format_date(task.due_date),
        category = escape(task.category.as_deref().unwrap_or("N/A")),
        created = format_datetime(task.created_at, utc_offset_minutes),
        toggle = if task.completed { "Reabrir" } else { "Concluir" },
        p_opts = priority_options(Some(task.priority)),
        due_iso = task
            .due_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        category_raw = escape(task.category.as_deref().unwrap_or("")),
    )
}

fn pagination(page: &Page<Task>, query: &TaskQuery) -> String {
    if page.total_pages <= 1 {
        return String::new();
    }
    let mut out = String::from("<nav class=\"pagination\">");
    if page.has_prev() {
        let _ = write!(
            out,
            "<a href=\"{}\">&laquo; Anterior</a> ",
            page_href(query, page.page - 1)
        );
    }
    let _ = write!(out, "Página {} de {}", page.page, page.total_pages);
    if page.has_next() {
        let _ = write!(
            out,
            " <a href=\"{}\">Próxima &raquo;</a>",
            page_href(query, page.page + 1)
        );
    }
    out.push_str("</nav>");
    out
}

pub fn index_page(
    user: &User,
    page: &Page<Task>,
    query: &TaskQuery,
    categories: &[String],
    flash: Option<Flash>,
    today: NaiveDate,
    utc_offset_minutes: i32,
) -> Html<String> {
    let mut items = String::new();
    for task in &page.items {
        items.push_str(&task_row(task, today, utc_offset_minutes));
        items.push('\n');
    }
    if page.items.is_empty() {
        items.push_str("<li class=\"empty\">Nenhuma tarefa encontrada.</li>\n");
    }

    let body = format!(
        "<p>Olá, {username}. <a href=\"/logout\">Sair</a></p>\n\
         {create}\n\
         {filters}\n\
         <ul class=\"tasks\">\n{items}</ul>\n\
         {pagination}",
        username = escape(&user.username),
        create = create_form(),
        filters = filter_form(query, categories),
        items = items,
        pagination = pagination(page, query),
    );

    layout("Minhas Tarefas", flash, &body)
}
