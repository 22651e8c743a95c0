use std::{io::Write, path::PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use client_core::{
    attachment::resolve_attachment_url, ConfirmPrompt, ControllerError, ControllerOptions,
    CrudController, DialogState, HttpRecordApi, RecordApi,
};
use shared::{
    domain::{Position, PositionDraft, PositionId, Teacher, TeacherDraft, TeacherId},
    record::Record,
};
use url::Url;

use crate::config::Settings;

#[derive(Subcommand, Debug)]
pub enum Resource {
    /// Job positions a teacher can hold.
    Positions {
        #[command(subcommand)]
        command: PositionCommand,
    },
    /// Teachers, with an optional picture.
    Teachers {
        #[command(subcommand)]
        command: TeacherCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum PositionCommand {
    List,
    Show {
        id: i64,
    },
    Create {
        #[arg(long)]
        name: String,
    },
    Update {
        id: i64,
        #[arg(long)]
        name: String,
    },
    Delete {
        id: i64,
        /// Skip the interactive question.
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Args, Debug, Default, Clone)]
pub struct TeacherFields {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub address: Option<String>,
    #[arg(long)]
    pub telephone: Option<String>,
    #[arg(long)]
    pub position_id: Option<i64>,
    /// Local image uploaded as the teacher's picture.
    #[arg(long)]
    pub image: Option<PathBuf>,
}

impl TeacherFields {
    fn apply(self, draft: &mut TeacherDraft) {
        if let Some(name) = self.name {
            draft.name = name;
        }
        if let Some(address) = self.address {
            draft.address = address;
        }
        if let Some(telephone) = self.telephone {
            draft.telephone = telephone;
        }
        if let Some(position_id) = self.position_id {
            draft.position_id = Some(PositionId(position_id));
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum TeacherCommand {
    List,
    Show {
        id: i64,
    },
    Create {
        #[command(flatten)]
        fields: TeacherFields,
    },
    Update {
        id: i64,
        #[command(flatten)]
        fields: TeacherFields,
    },
    Delete {
        id: i64,
        #[arg(long)]
        yes: bool,
    },
}

type FillDraft<R> = Box<dyn FnOnce(&mut <R as Record>::Draft) + Send>;

enum Action<R: Record> {
    List,
    Show(R::Id),
    Save {
        target: Option<R::Id>,
        fill: FillDraft<R>,
        image: Option<PathBuf>,
    },
    Delete {
        id: R::Id,
        confirmed: bool,
    },
}

/// Console rendering of a record.
pub trait Render: Record {
    fn row(&self) -> String;
    fn details(&self, asset_origin: &Url) -> Vec<(&'static str, String)>;
}

impl Render for Position {
    fn row(&self) -> String {
        format!("{}\t{}", self.id, self.name)
    }

    fn details(&self, _asset_origin: &Url) -> Vec<(&'static str, String)> {
        vec![
            ("id", self.id.to_string()),
            ("name", self.name.clone()),
            ("created", self.created_at.clone().unwrap_or_else(|| "-".into())),
            ("updated", self.updated_at.clone().unwrap_or_else(|| "-".into())),
        ]
    }
}

impl Render for Teacher {
    fn row(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}",
            self.id,
            self.name,
            self.position_name.as_deref().unwrap_or("-"),
            self.telephone
        )
    }

    fn details(&self, asset_origin: &Url) -> Vec<(&'static str, String)> {
        vec![
            ("id", self.id.to_string()),
            ("name", self.name.clone()),
            ("address", self.address.clone()),
            ("telephone", self.telephone.clone()),
            (
                "position",
                self.position_name.clone().unwrap_or_else(|| "-".into()),
            ),
            (
                "image",
                resolve_attachment_url(asset_origin, self.attachment_ref()),
            ),
        ]
    }
}

pub async fn run<W: Write>(
    resource: Resource,
    settings: &Settings,
    prompt: &dyn ConfirmPrompt,
    out: &mut W,
) -> Result<()> {
    let origin = settings.api_base()?;
    let http = reqwest::Client::new();

    match resource {
        Resource::Positions { command } => {
            let action = match command {
                PositionCommand::List => Action::List,
                PositionCommand::Show { id } => Action::Show(PositionId(id)),
                PositionCommand::Create { name } => Action::Save {
                    target: None,
                    fill: Box::new(move |draft: &mut PositionDraft| draft.name = name),
                    image: None,
                },
                PositionCommand::Update { id, name } => Action::Save {
                    target: Some(PositionId(id)),
                    fill: Box::new(move |draft: &mut PositionDraft| draft.name = name),
                    image: None,
                },
                PositionCommand::Delete { id, yes } => Action::Delete {
                    id: PositionId(id),
                    confirmed: yes,
                },
            };
            let controller = build_controller::<Position>(http, settings, &origin);
            execute(&controller, action, &origin, prompt, out).await
        }
        Resource::Teachers { command } => {
            let action = match command {
                TeacherCommand::List => Action::List,
                TeacherCommand::Show { id } => Action::Show(TeacherId(id)),
                TeacherCommand::Create { mut fields } => {
                    if fields.name.as_deref().map_or(true, str::is_empty) {
                        bail!("--name is required to create a teacher");
                    }
                    let options = position_options(&http, settings).await?;
                    check_position(fields.position_id, &options)?;
                    let image = fields.image.take();
                    Action::Save {
                        target: None,
                        fill: Box::new(move |draft: &mut TeacherDraft| fields.apply(draft)),
                        image,
                    }
                }
                TeacherCommand::Update { id, mut fields } => {
                    if fields.position_id.is_some() {
                        let options = position_options(&http, settings).await?;
                        check_position(fields.position_id, &options)?;
                    }
                    let image = fields.image.take();
                    Action::Save {
                        target: Some(TeacherId(id)),
                        fill: Box::new(move |draft: &mut TeacherDraft| fields.apply(draft)),
                        image,
                    }
                }
                TeacherCommand::Delete { id, yes } => Action::Delete {
                    id: TeacherId(id),
                    confirmed: yes,
                },
            };
            let controller = build_controller::<Teacher>(http, settings, &origin);
            execute(&controller, action, &origin, prompt, out).await
        }
    }
}

/// Positions a teacher can be assigned to, fetched alongside the teacher form.
async fn position_options(http: &reqwest::Client, settings: &Settings) -> Result<Vec<Position>> {
    HttpRecordApi::<Position>::with_client(http.clone(), settings.api_base_url.trim())
        .list()
        .await
        .context("failed to load position options")
}

fn check_position(requested: Option<i64>, options: &[Position]) -> Result<()> {
    if options.is_empty() {
        bail!("no positions exist yet; create one before adding teachers");
    }
    let choices = || {
        options
            .iter()
            .map(|position| format!("{} ({})", position.id, position.name))
            .collect::<Vec<_>>()
            .join(", ")
    };
    match requested {
        None => bail!("--position-id is required; choose one of: {}", choices()),
        Some(id) if options.iter().any(|position| position.id == PositionId(id)) => Ok(()),
        Some(id) => bail!("unknown position id {id}; choose one of: {}", choices()),
    }
}

fn build_controller<R: Record>(
    http: reqwest::Client,
    settings: &Settings,
    origin: &Url,
) -> CrudController<R> {
    let api = HttpRecordApi::<R>::with_client(http, settings.api_base_url.trim());
    let options =
        ControllerOptions::new(origin.clone()).with_notification_ttl(settings.notification_ttl());
    CrudController::new(api, options)
}

async fn execute<R: Render, W: Write>(
    controller: &CrudController<R>,
    action: Action<R>,
    origin: &Url,
    prompt: &dyn ConfirmPrompt,
    out: &mut W,
) -> Result<()> {
    match action {
        Action::List => {
            report(controller, controller.load().await, out).await?;
            let collection = controller.collection().await;
            if collection.is_empty() {
                writeln!(out, "No {}s.", R::ENDPOINT.label)?;
            }
            for record in collection {
                writeln!(out, "{}", record.row())?;
            }
        }
        Action::Show(id) => {
            report(controller, controller.load().await, out).await?;
            controller.open_detail(id).await?;
            if let DialogState::Detail(record) = controller.dialog().await {
                for (key, value) in record.details(origin) {
                    writeln!(out, "{key:>10}: {value}")?;
                }
            }
            controller.close_dialog().await;
        }
        Action::Save {
            target,
            fill,
            image,
        } => {
            match target {
                None => controller.open_create().await,
                Some(id) => {
                    report(controller, controller.load().await, out).await?;
                    controller.open_edit(id).await?;
                }
            }
            controller.edit_draft(fill).await?;
            if let Some(path) = image {
                controller.select_attachment(&path).await?;
            }
            let result = controller.submit().await;
            report(controller, result, out).await?;
        }
        Action::Delete { id, confirmed } => {
            report(controller, controller.load().await, out).await?;
            if confirmed {
                controller.open_delete(id).await?;
                let result = controller.confirm_delete().await;
                report(controller, result, out).await?;
            } else {
                let result = controller.delete_with_prompt(id, prompt).await;
                if matches!(result, Ok(false)) {
                    writeln!(out, "Cancelled.")?;
                    return Ok(());
                }
                report(controller, result.map(|_| ()), out).await?;
            }
        }
    }
    Ok(())
}

/// Prints the current notification, if any, and turns a failure into an error.
async fn report<R: Record, W: Write>(
    controller: &CrudController<R>,
    result: Result<(), ControllerError>,
    out: &mut W,
) -> Result<()> {
    if let Some(notification) = controller.notification().await {
        writeln!(out, "[{}] {}", notification.kind, notification.text)?;
    }
    result.with_context(|| format!("{} request failed", R::ENDPOINT.label))
}

#[cfg(test)]
#[path = "tests/commands_tests.rs"]
mod tests;
