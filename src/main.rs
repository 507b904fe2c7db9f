use anyhow::{anyhow, bail, Result};
use crossterm::style::Stylize;
use reedline::{
    default_emacs_keybindings, ColumnarMenu, Emacs, FileBackedHistory, KeyCode, KeyModifiers,
    MenuBuilder, Prompt, PromptEditMode, PromptHistorySearch, PromptHistorySearchStatus, Reedline,
    ReedlineEvent, ReedlineMenu, Signal,
};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::{info, warn};

mod completer;

use completer::{CommandCompleter, Vocabulary};
use symptom_cli::api::Credentials;
use symptom_cli::api_client::{ApiClient, ApiError};
use symptom_cli::commands::{CliCommand, ReplCommand, View};
use symptom_cli::config::config::Config;
use symptom_cli::data::data_exporter::DataExporter;
use symptom_cli::data::datatable::Dataset;
use symptom_cli::data::list_table::{ListRow, ListTable, MoveDirection, RowAction, PAGE_SIZES};
use symptom_cli::data::records_table::RecordsTable;
use symptom_cli::form_validator::{
    apply_mask, batch_request, current_defaults, event_form, login_form, record_edit_form,
    record_form, symptom_form, user_form, FormValidator, DATE_MASK, TIME_MASK,
};
use symptom_cli::search_filter::SearchFilter;
use symptom_cli::services::{find_symptom, reorder_symptoms, DataLoaderService};
use symptom_cli::table_display::{display_list, display_records};
use symptom_cli::utils::app_paths::AppPaths;
use symptom_cli::utils::logging::{get_log_buffer, init_tracing};

const CEP_MASK: &str = "[00000]-[000]";

struct SymptomPrompt {
    view: String,
    page: String,
}

impl Prompt for SymptomPrompt {
    fn render_prompt_left(&self) -> Cow<'_, str> {
        Cow::Owned(self.view.clone())
    }

    fn render_prompt_right(&self) -> Cow<'_, str> {
        Cow::Owned(self.page.clone())
    }

    fn render_prompt_indicator(&self, edit_mode: PromptEditMode) -> Cow<'_, str> {
        match edit_mode {
            PromptEditMode::Default | PromptEditMode::Emacs => "> ".into(),
            PromptEditMode::Vi(vi_mode) => match vi_mode {
                reedline::PromptViMode::Normal => "N> ".into(),
                reedline::PromptViMode::Insert => "I> ".into(),
            },
            PromptEditMode::Custom(str) => format!("{str}> ").into(),
        }
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<'_, str> {
        Cow::Borrowed("... ")
    }

    fn render_prompt_history_search_indicator(
        &self,
        history_search: PromptHistorySearch,
    ) -> Cow<'_, str> {
        let prefix = match history_search.status {
            PromptHistorySearchStatus::Passing => "",
            PromptHistorySearchStatus::Failing => "failing ",
        };
        Cow::Owned(format!(
            "({}reverse search: {})",
            prefix, history_search.term
        ))
    }
}

/// The table currently browsed
enum ActiveTable {
    Records(RecordsTable),
    List(ListTable),
}

impl ActiveTable {
    fn show(&self, config: &Config) {
        match self {
            ActiveTable::Records(table) => {
                if let Some(grid) = table.last_render() {
                    display_records(grid, &config.display);
                }
            }
            ActiveTable::List(table) => {
                if let Some(grid) = table.last_render() {
                    display_list(grid);
                }
            }
        }
    }

    fn dataset(&self) -> &Dataset {
        match self {
            ActiveTable::Records(table) => table.dataset(),
            ActiveTable::List(table) => table.dataset(),
        }
    }

    fn page_label(&self) -> String {
        match self {
            ActiveTable::Records(table) => table.pagination().label(),
            ActiveTable::List(table) => table
                .last_render()
                .map(|grid| grid.pagination.label())
                .unwrap_or_default(),
        }
    }

    fn next_page(&mut self) -> bool {
        match self {
            ActiveTable::Records(table) => table.next_page(),
            ActiveTable::List(table) => table.next_page(),
        }
    }

    fn previous_page(&mut self) -> bool {
        match self {
            ActiveTable::Records(table) => table.previous_page(),
            ActiveTable::List(table) => table.previous_page(),
        }
    }

    /// Records tables accept any page; lists walk to the nearest valid one
    fn go_to_page(&mut self, page: usize) {
        match self {
            ActiveTable::Records(table) => {
                table.set_page(page);
            }
            ActiveTable::List(table) => {
                while table.current_page() < page && table.next_page() {}
                while table.current_page() > page && table.previous_page() {}
            }
        }
    }

    fn search(&mut self, term: &str) {
        match self {
            ActiveTable::Records(table) => {
                table.search(term);
            }
            ActiveTable::List(table) => {
                table.search(term);
            }
        }
    }

    fn sort_by(&mut self, column_id: &str) {
        match self {
            ActiveTable::Records(table) => {
                table.sort_by(column_id);
            }
            ActiveTable::List(table) => {
                table.sort_by(column_id);
            }
        }
    }

    fn export(&self, path: &std::path::Path) -> Result<String> {
        match self {
            ActiveTable::Records(table) => {
                let grid = table
                    .last_render()
                    .ok_or_else(|| anyhow!("No data to export"))?;
                DataExporter::export_grid_to_file(grid, path)
            }
            ActiveTable::List(table) => {
                let grid = table
                    .last_render()
                    .ok_or_else(|| anyhow!("No data to export"))?;
                DataExporter::export_list_to_file(grid, path)
            }
        }
    }
}

fn view_name(view: &View) -> String {
    match view {
        View::History => "historico".to_string(),
        View::Events => "eventos".to_string(),
        View::Symptoms => "sintomas".to_string(),
        View::Records(symptom) => format!("registros:{}", symptom),
    }
}

fn open_view(client: &ApiClient, config: &Config, view: &View) -> Result<ActiveTable> {
    let service = DataLoaderService::new(client, config);
    Ok(match view {
        View::History => ActiveTable::Records(service.load_history()?),
        View::Events => ActiveTable::List(service.load_events()?),
        View::Symptoms => ActiveTable::List(service.load_symptoms()?),
        View::Records(query) => {
            let symptom = service.resolve_symptom(query)?;
            ActiveTable::List(service.load_symptom_records(&symptom)?)
        }
    })
}

fn report_error(e: &anyhow::Error) {
    match e.downcast_ref::<ApiError>() {
        Some(ApiError::Unauthorized) => eprintln!(
            "{}",
            "Sessão expirada ou inexistente. Entre com: symptom-cli login".yellow()
        ),
        _ => eprintln!("{}", format!("Erro: {:#}", e).red()),
    }
}

fn print_help() {
    println!("{}", "Symptom CLI - symptom history in the terminal".blue().bold());
    println!();
    println!("{}", "Usage:".yellow());
    println!("  symptom-cli [COMMAND] [--page N] [--no-repl]");
    println!();
    println!("{}", "Views:".yellow());
    println!("  {}            - Daily averages per symptom (default)", "history".green());
    println!("  {}             - Event list", "events".green());
    println!("  {}           - Symptom list", "symptoms".green());
    println!("  {} - Values logged for one symptom", "records <symptom>".green());
    println!();
    println!("{}", "Commands:".yellow());
    println!("  {} / {} / {}", "login".green(), "logout".green(), "status".green());
    println!("  {} / {}", "register".green(), "account".green());
    println!(
        "  {} / {} / {} / {}",
        "add-record".green(),
        "add-batch".green(),
        "add-event".green(),
        "add-symptom".green()
    );
    println!("  {} - Export a view to CSV", "export <view> [file.csv]".green());
    println!();
    println!("{}", "Options:".yellow());
    println!(
        "  {}  - Initialize configuration with wizard",
        "--init-config".green()
    );
    println!(
        "  {} - Generate config file with defaults",
        "--generate-config".green()
    );
    println!();
}

fn print_repl_help() {
    println!("{}", "Commands:".yellow());
    println!("  {} / {}      - Next / previous page", "\\next".green(), "\\prev".green());
    println!("  {}          - Go to page n", "\\page <n>".green());
    println!("  {}   - Rows per page of a list (5, 10, 25, 50)", "\\pagesize <n>".green());
    println!("  {}     - Filter rows (empty clears); plain text works too", "\\search <t>".green());
    println!("  {}     - Sort by column id or label", "\\sort <col>".green());
    println!("  {}   - Export the current page to CSV", "\\export [file]".green());
    println!("  {}  - Switch view (history, events, symptoms, records <s>)", "\\open <view>".green());
    println!("  {} / {} / {} - Row actions on lists", "\\edit <row>".green(), "\\delete <row>".green(), "\\delete-date <row>".green());
    println!("  {} - Move a symptom up or down", "\\move <row> <up|down>".green());
    println!("  {}          - Reload from the server", "\\reload".green());
    println!("  {}       - Show recent log entries", "\\log [n]".green());
    println!("  {} / {} / {}", "\\help".green(), "\\clear".green(), "\\quit".green());
}

/// Read one line; an empty answer takes `default`
fn prompt_line(label: &str, default: Option<&str>) -> Result<String> {
    match default {
        Some(d) if !d.is_empty() => print!("{} [{}]: ", label, d),
        _ => print!("{}: ", label),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();
    Ok(if input.is_empty() {
        default.unwrap_or("").to_string()
    } else {
        input.to_string()
    })
}

/// Like [`prompt_line`], but typed digits go through `mask`
fn prompt_masked(label: &str, default: Option<&str>, mask: &str) -> Result<String> {
    let raw = prompt_line(label, default)?;
    if Some(raw.as_str()) == default {
        return Ok(raw);
    }
    Ok(apply_mask(mask, &raw))
}

fn confirm(question: &str) -> Result<bool> {
    let answer = prompt_line(&format!("{} (s/N)", question), None)?;
    Ok(matches!(answer.to_lowercase().as_str(), "s" | "sim" | "y" | "yes"))
}

fn validate(form: &FormValidator, values: HashMap<String, String>) -> Result<Value> {
    form.validate(&values)
        .map(Value::Object)
        .map_err(|e| anyhow!(e.message))
}

fn success(config: &Config, message: &str) {
    println!("{}", format!("{} {}", config.display.icons.success, message).green());
}

fn prompt_date_time(defaults: (&str, &str)) -> Result<(String, String)> {
    Ok((
        prompt_masked("Data (dd/mm/aaaa)", Some(defaults.0), DATE_MASK)?,
        prompt_masked("Hora (hh:mm)", Some(defaults.1), TIME_MASK)?,
    ))
}

fn login(client: &ApiClient) -> Result<()> {
    let mut values = HashMap::new();
    values.insert("username".to_string(), prompt_line("Usuário", None)?);
    values.insert("password".to_string(), prompt_line("Senha", None)?);
    login_form()
        .validate(&values)
        .map_err(|e| anyhow!(e.message))?;

    let credentials = Credentials {
        username: values.remove("username").unwrap_or_default(),
        password: values.remove("password").unwrap_or_default(),
    };
    match client.login(&credentials) {
        Ok(message) => {
            println!("{}", message.green());
            Ok(())
        }
        Err(ApiError::Unauthorized) => bail!("Credenciais de login inválidas"),
        Err(e) => Err(e.into()),
    }
}

fn user_values(defaults: &Map<String, Value>) -> Result<HashMap<String, String>> {
    let default = |key: &str| defaults.get(key).and_then(Value::as_str).map(str::to_string);
    let mut values = HashMap::new();
    for (key, label) in [("username", "Usuário"), ("email", "E-mail")] {
        values.insert(key.to_string(), prompt_line(label, default(key).as_deref())?);
    }
    values.insert(
        "cep".to_string(),
        prompt_masked("CEP", default("cep").as_deref(), CEP_MASK)?,
    );
    for (key, label) in [("city", "Cidade"), ("state", "Estado"), ("password", "Senha")] {
        values.insert(key.to_string(), prompt_line(label, default(key).as_deref())?);
    }
    Ok(values)
}

fn register(client: &ApiClient, config: &Config) -> Result<()> {
    let body = validate(&user_form(false), user_values(&Map::new())?)?;
    success(config, &client.add_user(&body)?);
    Ok(())
}

fn account(client: &ApiClient, config: &Config) -> Result<()> {
    let user = client.get_user()?;
    println!(
        "{} <{}> - {} {}/{}",
        user.username.as_str().bold(),
        user.email,
        user.cep,
        user.city,
        user.state
    );
    if !confirm("Editar dados?")? {
        return Ok(());
    }

    let defaults = match serde_json::to_value(&user)? {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    let body = validate(&user_form(true), user_values(&defaults)?)?;
    success(config, &client.update_user(&body)?);
    Ok(())
}

fn add_symptom(client: &ApiClient, config: &Config) -> Result<()> {
    let mut values = HashMap::new();
    values.insert("name".to_string(), prompt_line("Sintoma", None)?);
    let body = validate(&symptom_form(), values)?;
    success(config, &client.add_symptom(&body)?);
    Ok(())
}

fn add_record(client: &ApiClient, config: &Config) -> Result<()> {
    let symptoms = client.get_symptoms()?;
    for symptom in &symptoms {
        println!("  {:>3}  {}", symptom.id, symptom.name);
    }
    let query = prompt_line("Sintoma (id ou nome)", None)?;
    let symptom_id = find_symptom(&symptoms, &query)
        .map(|s| s.id.to_string())
        .unwrap_or_default();

    let (today, now) = current_defaults();
    let (date, time) = prompt_date_time((&today, &now))?;
    let value = prompt_line("Valor (0 a 10)", None)?;

    let values = HashMap::from([
        ("symptom_id".to_string(), symptom_id),
        ("date".to_string(), date),
        ("time".to_string(), time),
        ("value".to_string(), value),
    ]);
    let body = validate(&record_form(), values)?;
    success(config, &client.add_record(&body)?);
    Ok(())
}

fn add_batch(client: &ApiClient, config: &Config) -> Result<()> {
    let symptoms = client.get_symptoms()?;
    let (today, now) = current_defaults();
    let (date, time) = prompt_date_time((&today, &now))?;

    println!("{}", "Valores (em branco para pular):".dark_grey());
    let mut raw = Vec::with_capacity(symptoms.len());
    for symptom in &symptoms {
        raw.push((symptom.id, prompt_line(&format!("  {}", symptom.name), None)?));
    }
    let inputs: Vec<(i64, &str)> = raw.iter().map(|(id, v)| (*id, v.as_str())).collect();

    let body = batch_request(&date, &time, &inputs).map_err(|e| anyhow!(e.message))?;
    success(config, &client.add_batch_records(&Value::Object(body))?);
    Ok(())
}

fn add_event(client: &ApiClient, config: &Config) -> Result<()> {
    let description = prompt_line("Descrição", None)?;
    let (today, now) = current_defaults();
    let (date, time) = prompt_date_time((&today, &now))?;

    let values = HashMap::from([
        ("description".to_string(), description),
        ("date".to_string(), date),
        ("time".to_string(), time),
    ]);
    let body = validate(&event_form(), values)?;
    success(config, &client.add_event(&body)?);
    Ok(())
}

fn row_id(row: &ListRow) -> Result<i64> {
    row.attribute("id")
        .and_then(|id| id.parse::<i64>().ok())
        .ok_or_else(|| anyhow!("Linha sem identificador"))
}

/// Run an edit/delete action on a row of the current list page
fn run_row_action(
    client: &ApiClient,
    config: &Config,
    view: &View,
    table: &ListTable,
    action: RowAction,
    row_number: usize,
) -> Result<()> {
    let grid = table
        .last_render()
        .ok_or_else(|| anyhow!("Nada carregado"))?;
    let row = grid
        .rows
        .get(row_number - 1)
        .filter(|r| r.source_index.is_some())
        .ok_or_else(|| anyhow!("Linha {} não existe nesta página", row_number))?;
    if !row.actions.contains(&action) {
        bail!("Ação '{}' não disponível aqui", action.label());
    }
    let id = row_id(row)?;
    let cell = |idx: usize| row.cells.get(idx).map(String::as_str);

    let message = match (action, view) {
        (RowAction::Delete, _) => {
            if !confirm(&format!("Excluir '{}'?", row.cells.join(" ")))? {
                return Ok(());
            }
            match view {
                View::Events => client.delete_event(id)?,
                View::Symptoms => client.delete_symptom(id)?,
                View::Records(_) => client.delete_record(id)?,
                View::History => bail!("Ação não disponível no histórico"),
            }
        }
        (RowAction::DeleteDate, View::Records(_)) => {
            let date = row
                .attribute("raw_date")
                .ok_or_else(|| anyhow!("Linha sem data"))?;
            if !confirm(&format!("Excluir todos os registros de {}?", cell(1).unwrap_or(date)))? {
                return Ok(());
            }
            client.delete_records_date(date)?
        }
        (RowAction::Edit, View::Events) => {
            let description = prompt_line("Descrição", row.attribute("description"))?;
            let (date, time) = prompt_date_time((cell(0).unwrap_or(""), row.attribute("time").unwrap_or("")))?;
            let values = HashMap::from([
                ("description".to_string(), description),
                ("date".to_string(), date),
                ("time".to_string(), time),
            ]);
            client.update_event(id, &validate(&event_form(), values)?)?
        }
        (RowAction::Edit, View::Symptoms) => {
            let values = HashMap::from([("name".to_string(), prompt_line("Sintoma", cell(0))?)]);
            client.update_symptom(id, &validate(&symptom_form(), values)?)?
        }
        (RowAction::Edit, View::Records(_)) => {
            let (date, time) = prompt_date_time((cell(1).unwrap_or(""), cell(2).unwrap_or("")))?;
            let value = prompt_line("Valor (0 a 10)", cell(3))?;
            let values = HashMap::from([
                ("date".to_string(), date),
                ("time".to_string(), time),
                ("value".to_string(), value),
            ]);
            client.update_record(id, &validate(&record_edit_form(), values)?)?
        }
        _ => bail!("Ação não disponível nesta visão"),
    };

    success(config, &message);
    Ok(())
}

/// Move a symptom one step and save the new order of the page
fn move_symptom(
    client: &ApiClient,
    config: &Config,
    table: &ListTable,
    row: usize,
    direction: MoveDirection,
) -> Result<()> {
    let grid = table
        .last_render()
        .ok_or_else(|| anyhow!("Nada carregado"))?;
    let order = reorder_symptoms(grid, row, direction)
        .ok_or_else(|| anyhow!("Não é possível mover a linha {}", row))?;
    success(config, &client.update_symptom_order(&order)?);
    Ok(())
}

/// Column id for `\sort`: an exact id, else the first column whose label
/// or id contains the text
fn resolve_column(dataset: &Dataset, text: &str) -> Option<String> {
    if dataset.get_column_index(text).is_some() {
        return Some(text.to_string());
    }
    SearchFilter::find_matching_columns(&dataset.columns, text)
        .first()
        .map(|(idx, _)| dataset.columns[*idx].id.clone())
}

fn refresh_vocabulary(vocabulary: &Vocabulary, active: &ActiveTable) {
    let mut words: Vec<String> = active
        .dataset()
        .columns
        .iter()
        .flat_map(|c| [c.id.clone(), c.display_label().to_string()])
        .collect();
    words.extend(["history", "events", "symptoms", "records", "up", "down"].map(String::from));
    words.sort();
    words.dedup();
    vocabulary.replace(words);
}

fn run_repl(client: &ApiClient, config: &Config, mut view: View, mut active: ActiveTable) -> Result<()> {
    println!("{}", "Type \\help for commands, Ctrl+D to quit".dark_grey());

    let history_file = AppPaths::history_file()?;
    let history = Box::new(
        FileBackedHistory::with_file(200, history_file)
            .map_err(|e| anyhow!("Error configuring history: {}", e))?,
    );

    let vocabulary = Vocabulary::default();
    refresh_vocabulary(&vocabulary, &active);
    let completer = Box::new(CommandCompleter::new(vocabulary.clone()));

    let completion_menu = Box::new(
        ColumnarMenu::default()
            .with_name("completion_menu")
            .with_columns(4)
            .with_column_width(None)
            .with_column_padding(2),
    );

    let mut keybindings = default_emacs_keybindings();
    keybindings.add_binding(
        KeyModifiers::NONE,
        KeyCode::Tab,
        ReedlineEvent::Menu("completion_menu".to_string()),
    );

    let mut line_editor = Reedline::create()
        .with_completer(completer)
        .with_menu(ReedlineMenu::EngineCompleter(completion_menu))
        .with_history(history)
        .with_edit_mode(Box::new(Emacs::new(keybindings)));

    loop {
        let prompt = SymptomPrompt {
            view: view_name(&view),
            page: active.page_label(),
        };

        let buffer = match line_editor.read_line(&prompt)? {
            Signal::Success(buffer) => buffer,
            Signal::CtrlD | Signal::CtrlC => {
                println!("\nAté logo!");
                break;
            }
        };
        let trimmed = buffer.trim();
        if trimmed.is_empty() {
            continue;
        }

        let command = if trimmed.starts_with('\\') {
            match ReplCommand::parse(trimmed) {
                Ok(command) => command,
                Err(usage) => {
                    eprintln!("{}", usage.red());
                    continue;
                }
            }
        } else {
            ReplCommand::Search(trimmed.to_string())
        };

        match command {
            ReplCommand::Help => print_repl_help(),
            ReplCommand::Clear => print!("{esc}[2J{esc}[1;1H", esc = 27 as char),
            ReplCommand::Quit => break,
            ReplCommand::Next => {
                if active.next_page() {
                    active.show(config);
                } else {
                    println!("{}", "Já está na última página".yellow());
                }
            }
            ReplCommand::Prev => {
                if active.previous_page() {
                    active.show(config);
                } else {
                    println!("{}", "Já está na primeira página".yellow());
                }
            }
            ReplCommand::Page(page) => {
                active.go_to_page(page);
                active.show(config);
            }
            ReplCommand::PageSize(size) => match &mut active {
                ActiveTable::List(table) if PAGE_SIZES.contains(&size) => {
                    table.change_page_size(size);
                    active.show(config);
                }
                ActiveTable::List(_) => {
                    eprintln!("{}", format!("Tamanhos disponíveis: {:?}", PAGE_SIZES).red())
                }
                ActiveTable::Records(_) => eprintln!(
                    "{}",
                    "O histórico pagina por colunas (records.columns_per_page)".red()
                ),
            },
            ReplCommand::Search(term) => {
                active.search(&term);
                active.show(config);
            }
            ReplCommand::Sort(text) => match resolve_column(active.dataset(), &text) {
                Some(column_id) => {
                    active.sort_by(&column_id);
                    active.show(config);
                }
                None => eprintln!("{}", format!("Coluna não encontrada: {}", text).red()),
            },
            ReplCommand::Export(path) => {
                let path = path.unwrap_or_else(|| DataExporter::default_filename(view.export_prefix()));
                match active.export(&path) {
                    Ok(message) => println!("{}", message.green()),
                    Err(e) => report_error(&e),
                }
            }
            ReplCommand::Log(count) => match get_log_buffer() {
                Some(buffer) => {
                    for entry in buffer.get_recent(count) {
                        println!("{}", entry.format_for_display().dark_grey());
                    }
                }
                None => println!("{}", "Logging is not initialized".yellow()),
            },
            ReplCommand::Open(next_view) => match open_view(client, config, &next_view) {
                Ok(table) => {
                    view = next_view;
                    active = table;
                    refresh_vocabulary(&vocabulary, &active);
                    active.show(config);
                }
                Err(e) => report_error(&e),
            },
            ReplCommand::Reload => match open_view(client, config, &view) {
                Ok(table) => {
                    active = table;
                    refresh_vocabulary(&vocabulary, &active);
                    active.show(config);
                }
                Err(e) => report_error(&e),
            },
            ReplCommand::Move { row, direction } => {
                let (View::Symptoms, ActiveTable::List(table)) = (&view, &active) else {
                    eprintln!("{}", "Reordenar só está disponível na lista de sintomas".red());
                    continue;
                };
                match move_symptom(client, config, table, row, direction) {
                    Ok(()) => match open_view(client, config, &view) {
                        Ok(table) => {
                            active = table;
                            active.show(config);
                        }
                        Err(e) => report_error(&e),
                    },
                    Err(e) => report_error(&e),
                }
            }
            ReplCommand::Action { action, row } => {
                let ActiveTable::List(table) = &active else {
                    eprintln!("{}", "Ações só estão disponíveis nas listas".red());
                    continue;
                };
                match run_row_action(client, config, &view, table, action, row) {
                    Ok(()) => match open_view(client, config, &view) {
                        Ok(table) => {
                            active = table;
                            active.show(config);
                        }
                        Err(e) => report_error(&e),
                    },
                    Err(e) => report_error(&e),
                }
            }
        }
    }

    Ok(())
}

fn build_client(config: &Config) -> Result<ApiClient> {
    let client = if config.server.persist_session {
        ApiClient::with_session_file(&config.server.base_url, AppPaths::session_file()?)?
    } else {
        ApiClient::new(&config.server.base_url)?
    };
    info!("Using API at {}", client.base_url());
    Ok(client)
}

fn run(command: CliCommand) -> Result<()> {
    let config = Config::load().unwrap_or_else(|e| {
        warn!("Could not load config, using defaults: {}", e);
        Config::default()
    });
    let client = build_client(&config)?;

    match command {
        CliCommand::Help | CliCommand::InitConfig | CliCommand::GenerateConfig => Ok(()),
        CliCommand::Login => login(&client),
        CliCommand::Logout => {
            println!("{}", client.logout()?.green());
            Ok(())
        }
        CliCommand::Status => {
            if client.auth_status()? {
                println!("{}", format!("Conectado a {}", client.base_url()).green());
            } else {
                println!("{}", "Não autenticado. Use: symptom-cli login".yellow());
            }
            Ok(())
        }
        CliCommand::Register => register(&client, &config),
        CliCommand::Account => account(&client, &config),
        CliCommand::AddRecord => add_record(&client, &config),
        CliCommand::AddBatch => add_batch(&client, &config),
        CliCommand::AddEvent => add_event(&client, &config),
        CliCommand::AddSymptom => add_symptom(&client, &config),
        CliCommand::Export { view, path } => {
            let active = open_view(&client, &config, &view)?;
            let path: PathBuf = path.unwrap_or_else(|| DataExporter::default_filename(view.export_prefix()));
            println!("{}", active.export(&path)?.green());
            Ok(())
        }
        CliCommand::Show {
            view,
            page,
            interactive,
        } => {
            let mut active = open_view(&client, &config, &view)?;
            if let Some(page) = page {
                active.go_to_page(page);
            }
            active.show(&config);
            if interactive {
                run_repl(&client, &config, view, active)?;
            }
            Ok(())
        }
    }
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match CliCommand::parse(&args) {
        Ok(command) => command,
        Err(usage) => {
            eprintln!("{}", usage.red());
            print_help();
            std::process::exit(2);
        }
    };

    match command {
        CliCommand::Help => {
            print_help();
            return;
        }
        CliCommand::InitConfig => match Config::init_wizard() {
            Ok(config) => {
                println!("\nConfiguration initialized successfully!");
                if !config.display.use_glyphs {
                    println!("Note: Simple mode enabled (ASCII icons)");
                }
                return;
            }
            Err(e) => {
                eprintln!("Error initializing config: {}", e);
                std::process::exit(1);
            }
        },
        CliCommand::GenerateConfig => match Config::get_config_path() {
            Ok(path) => {
                if let Some(parent) = path.parent() {
                    if let Err(e) = std::fs::create_dir_all(parent) {
                        eprintln!("Error creating config directory: {}", e);
                        std::process::exit(1);
                    }
                }
                if let Err(e) = std::fs::write(&path, Config::create_default_with_comments()) {
                    eprintln!("Error writing config file: {}", e);
                    std::process::exit(1);
                }
                println!("Configuration file created at: {:?}", path);
                println!("Edit this file to customize your symptom-cli setup.");
                return;
            }
            Err(e) => {
                eprintln!("Error determining config path: {}", e);
                std::process::exit(1);
            }
        },
        _ => {}
    }

    if let Some(log_path) = init_tracing(AppPaths::log_dir().ok()) {
        if std::env::var_os("SYMPTOM_CLI_DEBUG").is_some() {
            eprintln!("📝 Logs: {}", log_path.display());
        }
    }

    if let Err(e) = run(command) {
        report_error(&e);
        std::process::exit(1);
    }
}
