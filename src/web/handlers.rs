//! Request handlers. Validation and conflict failures recover locally with
//! a flash message and a redirect; only not-found and store failures
//! propagate as [`AppError`].

use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use chrono::NaiveDate;
use serde::Deserialize;
use tower_sessions::Session;

use crate::auth::Credentials;
use crate::models::{Priority, Task, User, MAX_DESCRIPTION_LEN};
use crate::query::{self, CategoryFilter, DueFilter, SortKey, SortOrder, StatusFilter, TaskQuery};
use crate::utils;
use crate::web::flash::{self, Level};
use crate::web::guard::{self, CurrentUser};
use crate::web::{views, AppError, Context};

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    /// Kept as text so a malformed value degrades to page 1 instead of
    /// rejecting the whole request.
    pub page: Option<String>,
    pub search_query: Option<String>,
    pub status_filter: Option<String>,
    pub priority_filter: Option<String>,
    pub due_date_filter: Option<String>,
    pub category_filter: Option<String>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
}

impl ListParams {
    fn into_query(self) -> TaskQuery {
        TaskQuery {
            search: self.search_query.filter(|s| !s.is_empty()),
            status: self
                .status_filter
                .as_deref()
                .map(StatusFilter::parse)
                .unwrap_or_default(),
            priority: self
                .priority_filter
                .as_deref()
                .and_then(TaskQuery::parse_priority),
            due: self
                .due_date_filter
                .as_deref()
                .map(DueFilter::parse)
                .unwrap_or_default(),
            category: self
                .category_filter
                .as_deref()
                .map(CategoryFilter::parse)
                .unwrap_or_default(),
            sort: self.sort_by.as_deref().map(SortKey::parse).unwrap_or_default(),
            order: self.order.as_deref().map(SortOrder::parse).unwrap_or_default(),
            page: self
                .page
                .as_deref()
                .and_then(|p| p.parse().ok())
                .unwrap_or(1),
        }
    }
}

/// `GET /` — the filtered, sorted, paginated task list
pub async fn index(
    State(ctx): State<Context>,
    user: CurrentUser,
    session: Session,
    Query(params): Query<ListParams>,
) -> Result<Response, AppError> {
    let user = user.0;
    let user_id = user.id.ok_or(AppError::NotFound)?;
    let query = params.into_query();

    let (tasks, categories) = {
        let db = ctx.db.lock().await;
        (db.tasks_for_user(user_id)?, db.task_categories(user_id)?)
    };

    let today = utils::today(ctx.config.utc_offset_minutes);
    let page = query::run(tasks, &query, today, ctx.config.page_size);
    let flash = flash::take(&session).await;

    Ok(views::index_page(
        &user,
        &page,
        &query,
        &categories,
        flash,
        today,
        ctx.config.utc_offset_minutes,
    )
    .into_response())
}

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub confirm_password: Option<String>,
}

/// `GET /register`
pub async fn register_form(session: Session) -> Result<Response, AppError> {
    if guard::session_user_id(&session).await.is_some() {
        return Ok(Redirect::to("/").into_response());
    }
    let flash = flash::take(&session).await;
    Ok(views::register_page(flash).into_response())
}

/// `POST /register`
pub async fn register(
    State(ctx): State<Context>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    if guard::session_user_id(&session).await.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    let username = form.username.unwrap_or_default().trim().to_string();
    let email = form.email.unwrap_or_default().trim().to_string();
    let password = form.password.unwrap_or_default();
    let confirm = form.confirm_password.unwrap_or_default();

    if username.is_empty() || email.is_empty() || password.is_empty() || confirm.is_empty() {
        flash::set(&session, Level::Danger, "Todos os campos são obrigatórios.").await?;
        return Ok(Redirect::to("/register").into_response());
    }

    if password != confirm {
        flash::set(&session, Level::Danger, "As senhas não coincidem.").await?;
        return Ok(Redirect::to("/register").into_response());
    }

    let db = ctx.db.lock().await;

    if db.username_taken(&username)? {
        flash::set(&session, Level::Danger, "Nome de usuário já existe. Escolha outro.").await?;
        return Ok(Redirect::to("/register").into_response());
    }

    if db.email_taken(&email)? {
        flash::set(&session, Level::Danger, "Este email já está registrado. Use outro.").await?;
        return Ok(Redirect::to("/register").into_response());
    }

    let mut user = User::new(username, email);
    user.set_password(&password)?;

    // The pre-checks race against concurrent registrations; the UNIQUE
    // constraints are the real gate.
    match db.insert_user(&user) {
        Ok(_) => {}
        Err(crate::database::DatabaseError::Conflict(_)) => {
            flash::set(&session, Level::Danger, "Nome de usuário ou email já registrado.").await?;
            return Ok(Redirect::to("/register").into_response());
        }
        Err(other) => return Err(other.into()),
    }

    tracing::info!(username = %user.username, "account registered");
    flash::set(
        &session,
        Level::Success,
        "Registro realizado com sucesso! Faça login para continuar.",
    )
    .await?;
    Ok(Redirect::to("/login").into_response())
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// `GET /login`
pub async fn login_form(session: Session) -> Result<Response, AppError> {
    if guard::session_user_id(&session).await.is_some() {
        return Ok(Redirect::to("/").into_response());
    }
    let flash = flash::take(&session).await;
    Ok(views::login_page(flash).into_response())
}

/// `POST /login`
pub async fn login(
    State(ctx): State<Context>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    if guard::session_user_id(&session).await.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    let username = form.username.unwrap_or_default();
    let password = form.password.unwrap_or_default();

    let user = {
        let db = ctx.db.lock().await;
        db.find_user_by_username(&username)?
    };

    // One generic message for unknown user and wrong password alike.
    match user {
        Some(user) if user.verify_password(&password) => {
            let user_id = user.id.ok_or(AppError::NotFound)?;
            guard::login_session(&session, user_id).await?;
            tracing::info!(username = %user.username, "login");
            flash::set(&session, Level::Success, "Login realizado com sucesso!").await?;
            Ok(Redirect::to("/").into_response())
        }
        _ => {
            flash::set(&session, Level::Danger, "Nome de usuário ou senha inválidos.").await?;
            Ok(Redirect::to("/login").into_response())
        }
    }
}

/// `GET /logout`
pub async fn logout(_user: CurrentUser, session: Session) -> Result<Response, AppError> {
    guard::logout_session(&session).await?;
    flash::set(&session, Level::Info, "Você foi desconectado.").await?;
    Ok(Redirect::to("/login").into_response())
}

#[derive(Debug, Deserialize)]
pub struct TaskForm {
    pub description: Option<String>,
    pub priority: Option<String>,
    pub due_date: Option<String>,
    pub category: Option<String>,
}

struct ValidatedTask {
    description: String,
    priority: Priority,
    due_date: Option<NaiveDate>,
    category: Option<String>,
}

/// Shared validation for the create and update forms. The error is the
/// user-facing flash message.
fn validate_task_form(form: TaskForm) -> Result<ValidatedTask, &'static str> {
    let description = form.description.unwrap_or_default().trim().to_string();
    if description.is_empty() {
        return Err("A descrição da tarefa é obrigatória.");
    }
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err("A descrição deve ter no máximo 200 caracteres.");
    }

    let priority = match form.priority.as_deref() {
        None | Some("") => Priority::default(),
        Some(value) => value.parse().map_err(|_| "Prioridade inválida.")?,
    };

    let due_date = match form.due_date.as_deref() {
        None | Some("") => None,
        Some(value) => Some(
            utils::parse_date(value).map_err(|_| "Formato de data de vencimento inválido.")?,
        ),
    };

    let category = form.category.filter(|c| !c.trim().is_empty());

    Ok(ValidatedTask {
        description,
        priority,
        due_date,
        category,
    })
}

/// `POST /create`
pub async fn create_task(
    State(ctx): State<Context>,
    user: CurrentUser,
    session: Session,
    Form(form): Form<TaskForm>,
) -> Result<Response, AppError> {
    let user_id = user.0.id.ok_or(AppError::NotFound)?;

    let valid = match validate_task_form(form) {
        Ok(valid) => valid,
        Err(message) => {
            flash::set(&session, Level::Danger, message).await?;
            return Ok(Redirect::to("/").into_response());
        }
    };

    let mut task = Task::new(valid.description, user_id);
    task.priority = valid.priority;
    task.due_date = valid.due_date;
    task.category = valid.category;

    {
        let db = ctx.db.lock().await;
        db.insert_task(&task)?;
    }

    flash::set(&session, Level::Success, "Tarefa criada com sucesso!").await?;
    Ok(Redirect::to("/").into_response())
}

/// Fetch a task and check it belongs to the caller. `Ok(None)` means the
/// ownership check failed and a flash naming the refused action (e.g.
/// "modificar", "deletar") has been set.
async fn owned_task(
    ctx: &Context,
    session: &Session,
    user: &User,
    task_id: i64,
    action: &str,
) -> Result<Option<Task>, AppError> {
    let task = {
        let db = ctx.db.lock().await;
        db.get_task(task_id)?
    };
    let task = task.ok_or(AppError::NotFound)?;

    if Some(task.user_id) != user.id {
        flash::set(
            session,
            Level::Danger,
            format!("Você não tem permissão para {action} esta tarefa."),
        )
        .await?;
        return Ok(None);
    }
    Ok(Some(task))
}

/// `POST /update/:id`
pub async fn update_task(
    State(ctx): State<Context>,
    user: CurrentUser,
    session: Session,
    Path(task_id): Path<i64>,
    Form(form): Form<TaskForm>,
) -> Result<Response, AppError> {
    let Some(_task) = owned_task(&ctx, &session, &user.0, task_id, "modificar").await? else {
        return Ok(Redirect::to("/").into_response());
    };

    let valid = match validate_task_form(form) {
        Ok(valid) => valid,
        Err(message) => {
            flash::set(&session, Level::Danger, message).await?;
            return Ok(Redirect::to("/").into_response());
        }
    };

    {
        let db = ctx.db.lock().await;
        db.update_task(
            task_id,
            &valid.description,
            valid.priority,
            valid.due_date,
            valid.category.as_deref(),
        )?;
    }

    flash::set(&session, Level::Success, "Tarefa atualizada com sucesso!").await?;
    Ok(Redirect::to("/").into_response())
}

/// `POST /complete/:id` — toggle the completion flag
pub async fn complete_task(
    State(ctx): State<Context>,
    user: CurrentUser,
    session: Session,
    Path(task_id): Path<i64>,
) -> Result<Response, AppError> {
    let Some(task) = owned_task(&ctx, &session, &user.0, task_id, "modificar").await? else {
        return Ok(Redirect::to("/").into_response());
    };

    {
        let db = ctx.db.lock().await;
        db.set_completed(task_id, !task.completed)?;
    }

    flash::set(&session, Level::Success, "Status da tarefa atualizado!").await?;
    Ok(Redirect::to("/").into_response())
}

/// `POST /delete/:id`
pub async fn delete_task(
    State(ctx): State<Context>,
    user: CurrentUser,
    session: Session,
    Path(task_id): Path<i64>,
) -> Result<Response, AppError> {
    let Some(_task) = owned_task(&ctx, &session, &user.0, task_id, "deletar").await? else {
        return Ok(Redirect::to("/").into_response());
    };

    let removed = {
        let db = ctx.db.lock().await;
        db.delete_task(task_id)?
    };
    if !removed {
        return Err(AppError::NotFound);
    }

    flash::set(&session, Level::Success, "Tarefa deletada com sucesso!").await?;
    Ok(Redirect::to("/").into_response())
}
