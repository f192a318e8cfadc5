//! Fitness tracker: log workouts, manage exercise types and chart progress.

use chrono::{Local, NaiveDate};
use dirs_next as dirs;
use eframe::{App, Frame, NativeOptions, egui};
use egui_extras::DatePickerButton;
use egui_plot::{Corner, Legend, Plot};
use rfd::FileDialog;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use log::info;

mod chart;
use chart::ChartSeries;
mod error;
use error::StoreError;
mod export;
use export::{save_workouts_csv, save_workouts_json};
mod registry;
use registry::ExerciseType;
mod store;
mod tracker;
use tracker::Tracker;
mod workouts;

/// Environment variable overriding the directory holding the JSON stores.
const NOTICE_DURATION: Duration = Duration::from_secs(4);

fn default_plot_width() -> f32 {
    560.0
}

fn default_plot_height() -> f32 {
    320.0
}

fn default_show_markers() -> bool {
    true
}

/// Persistent user preferences.
///
/// Every field carries a serde default so settings files written by older
/// versions keep loading.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct Settings {
    /// Directory for `exercise_types.json` and `workouts.json`.
    #[serde(default)]
    data_dir: Option<String>,
    /// Exercise type last shown in the chart window.
    #[serde(default)]
    chart_type: Option<String>,
    #[serde(default = "default_plot_width")]
    plot_width: f32,
    #[serde(default = "default_plot_height")]
    plot_height: f32,
    #[serde(default = "default_show_markers")]
    show_markers: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: None,
            chart_type: None,
            plot_width: default_plot_width(),
            plot_height: default_plot_height(),
            show_markers: default_show_markers(),
        }
    }
}

impl Settings {
    const FILE: &'static str = "fitness_tracker_settings.json";

    fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join(Self::FILE))
    }

    fn load() -> Self {
        if let Some(path) = Self::path() {
            if let Ok(data) = std::fs::read_to_string(&path) {
                match serde_json::from_str(&data) {
                    Ok(cfg) => return cfg,
                    Err(e) => log::warn!("Ignoring {}: {e}", path.display()),
                }
            }
        }
        Self::default()
    }

    fn save(&self) {
        let Some(path) = Self::path() else {
            return;
        };
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        match serde_json::to_string_pretty(self) {
            Ok(data) => {
                if let Err(e) = std::fs::write(&path, data) {
                    log::error!("Failed to save settings to {}: {e}", path.display());
                }
            }
            Err(e) => log::error!("Failed to serialize settings: {e}"),
        }
    }

    fn data_dir(&self) -> PathBuf {
        resolve_data_dir(self.data_dir.as_deref(), dirs::data_dir())
    }
}

/// Pick the store directory: settings, then the platform data directory,
/// then the working directory.
fn resolve_data_dir(configured: Option<&str>, platform_dir: Option<PathBuf>) -> PathBuf {
    configured
        .filter(|d| !d.trim().is_empty())
        .map(PathBuf::from)
        .or_else(|| platform_dir.map(|p| p.join("fitness_tracker")))
        .unwrap_or_else(|| PathBuf::from("."))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExportFormat {
    Csv,
    Json,
}

struct Notice {
    text: String,
    is_error: bool,
    start: Instant,
}

struct TrackerApp {
    tracker: Option<Tracker>,
    startup_error: Option<String>,
    settings: Settings,
    settings_dirty: bool,
    form_type: String,
    form_amount: String,
    form_date: String,
    picked_date: NaiveDate,
    selected_workout: Option<usize>,
    show_types: bool,
    selected_type: Option<String>,
    type_name: String,
    type_unit: String,
    confirm_remove: Option<String>,
    show_chart: bool,
    chart_type: String,
    show_preferences: bool,
    notice: Option<Notice>,
}

impl Default for TrackerApp {
    fn default() -> Self {
        let settings = Settings::load();
        let dir = settings.data_dir();
        info!("Using data directory {}", dir.display());
        let opened = Tracker::open(&dir);
        Self::new(settings, opened)
    }
}

impl TrackerApp {
    fn new(settings: Settings, opened: Result<Tracker, StoreError>) -> Self {
        let (tracker, startup_error) = match opened {
            Ok(t) => (Some(t), None),
            Err(e) => {
                log::error!("Failed to load data: {e}");
                (None, Some(e.to_string()))
            }
        };
        let today = Local::now().date_naive();
        let chart_type = settings.chart_type.clone().unwrap_or_default();
        Self {
            tracker,
            startup_error,
            settings,
            settings_dirty: false,
            form_type: String::new(),
            form_amount: String::new(),
            form_date: today.format("%Y-%m-%d").to_string(),
            picked_date: today,
            selected_workout: None,
            show_types: false,
            selected_type: None,
            type_name: String::new(),
            type_unit: String::new(),
            confirm_remove: None,
            show_chart: false,
            chart_type,
            show_preferences: false,
            notice: None,
        }
    }

    fn notify(&mut self, text: impl Into<String>, is_error: bool) {
        let text = text.into();
        if is_error {
            log::error!("{text}");
        }
        self.notice = Some(Notice {
            text,
            is_error,
            start: Instant::now(),
        });
    }

    fn type_names(&self) -> Vec<String> {
        self.tracker
            .as_ref()
            .map(|t| t.list_exercise_types())
            .unwrap_or_default()
    }

    fn submit_form(&mut self) {
        let Some(tracker) = self.tracker.as_mut() else {
            return;
        };
        match tracker.submit_workout(&self.form_type, &self.form_amount, &self.form_date) {
            Ok(_) => {
                self.form_type.clear();
                self.form_amount.clear();
                self.form_date.clear();
            }
            Err(e) => self.notify(e.to_string(), true),
        }
    }

    fn remove_selected_workout(&mut self) {
        let (Some(tracker), Some(idx)) = (self.tracker.as_mut(), self.selected_workout) else {
            return;
        };
        let result = tracker.delete_workout(idx);
        self.selected_workout = None;
        if let Err(e) = result {
            self.notify(e.to_string(), true);
        }
    }

    fn add_type(&mut self) {
        let Some(tracker) = self.tracker.as_mut() else {
            return;
        };
        let name = self.type_name.trim().to_string();
        match tracker.add_exercise_type(&name, self.type_unit.trim()) {
            Ok(()) => {
                self.selected_type = Some(name);
            }
            Err(e) => self.notify(e.to_string(), true),
        }
    }

    fn save_type_edit(&mut self) {
        let (Some(tracker), Some(old)) = (self.tracker.as_mut(), self.selected_type.clone()) else {
            return;
        };
        let new_name = self.type_name.trim().to_string();
        match tracker.rename_exercise_type(&old, &new_name, self.type_unit.trim()) {
            Ok(()) => {
                if self.form_type == old {
                    self.form_type = new_name.clone();
                }
                if self.chart_type == old {
                    self.set_chart_type(new_name.clone());
                }
                self.selected_type = Some(new_name);
            }
            Err(e) => self.notify(e.to_string(), true),
        }
    }

    fn remove_type(&mut self, name: &str) {
        let Some(tracker) = self.tracker.as_mut() else {
            return;
        };
        match tracker.remove_exercise_type(name) {
            Ok(_) => {
                if self.selected_type.as_deref() == Some(name) {
                    self.selected_type = None;
                    self.type_name.clear();
                    self.type_unit.clear();
                }
                if self.form_type == name {
                    self.form_type.clear();
                }
            }
            Err(e) => self.notify(e.to_string(), true),
        }
    }

    fn set_chart_type(&mut self, name: String) {
        self.settings.chart_type = Some(name.clone());
        self.chart_type = name;
        self.settings_dirty = true;
    }

    fn export_workouts(&mut self, format: ExportFormat) {
        let Some(records) = self.tracker.as_ref().map(|t| t.log().records().to_vec()) else {
            return;
        };
        let (label, ext) = match format {
            ExportFormat::Csv => ("CSV", "csv"),
            ExportFormat::Json => ("JSON", "json"),
        };
        let Some(path) = FileDialog::new()
            .add_filter(label, &[ext])
            .set_file_name(format!("workouts.{ext}"))
            .save_file()
        else {
            return;
        };
        let result = match format {
            ExportFormat::Csv => save_workouts_csv(&path, &records).map_err(|e| e.to_string()),
            ExportFormat::Json => save_workouts_json(&path, &records).map_err(|e| e.to_string()),
        };
        match result {
            Ok(()) => {
                info!("Exported {} workouts to {}", records.len(), path.display());
                self.notify(format!("Exported {} workouts", records.len()), false);
            }
            Err(e) => self.notify(format!("Failed to export workouts: {e}"), true),
        }
    }

    fn export_chart(&mut self, series: &ChartSeries) {
        let Some(path) = FileDialog::new()
            .add_filter("PNG", &["png"])
            .set_file_name("chart.png")
            .save_file()
        else {
            return;
        };
        let size = (
            (self.settings.plot_width * 1.5) as u32,
            (self.settings.plot_height * 1.5) as u32,
        );
        match chart::save_png(series, &path, size) {
            Ok(()) => {
                info!("Saved chart to {}", path.display());
                self.notify("Chart saved", false);
            }
            Err(e) => self.notify(format!("Failed to save chart: {e}"), true),
        }
    }

    fn menu_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Export Workouts (CSV)").clicked() {
                        ui.close_menu();
                        self.export_workouts(ExportFormat::Csv);
                    }
                    if ui.button("Export Workouts (JSON)").clicked() {
                        ui.close_menu();
                        self.export_workouts(ExportFormat::Json);
                    }
                    if ui.button("Preferences").clicked() {
                        self.show_preferences = true;
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Quit").clicked() {
                        ui.ctx().send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });
                if ui.button("Settings").clicked() {
                    self.show_types = true;
                }
                if ui.button("See Chart").clicked() {
                    self.show_chart = true;
                }
            });
        });
    }

    fn form_panel(&mut self, ui: &mut egui::Ui) {
        let types = self.type_names();
        ui.add_space(8.0);
        ui.label("Exercise Type:");
        egui::ComboBox::from_id_source("form_type_combo")
            .selected_text(if self.form_type.is_empty() {
                "Select"
            } else {
                self.form_type.as_str()
            })
            .show_ui(ui, |ui| {
                for t in &types {
                    ui.selectable_value(&mut self.form_type, t.clone(), t);
                }
            });
        ui.add_space(8.0);
        ui.label("Amount:");
        ui.text_edit_singleline(&mut self.form_amount);
        ui.add_space(8.0);
        ui.label("Date:");
        ui.horizontal(|ui| {
            ui.add(egui::TextEdit::singleline(&mut self.form_date).desired_width(90.0));
            if ui
                .add(DatePickerButton::new(&mut self.picked_date).id_source("form_date"))
                .changed()
            {
                self.form_date = self.picked_date.format("%Y-%m-%d").to_string();
            }
        });
        ui.add_space(12.0);
        if ui.button("Add Workout").clicked() {
            self.submit_form();
        }
    }

    fn workout_list(&mut self, ui: &mut egui::Ui) {
        let lines = self
            .tracker
            .as_ref()
            .map(|t| t.list_workouts())
            .unwrap_or_default();
        if self.selected_workout.is_some_and(|i| i >= lines.len()) {
            self.selected_workout = None;
        }
        ui.horizontal(|ui| {
            ui.heading("Workouts");
            if ui
                .add_enabled(
                    self.selected_workout.is_some(),
                    egui::Button::new("Remove Workout"),
                )
                .clicked()
            {
                self.remove_selected_workout();
            }
        });
        ui.separator();
        if lines.is_empty() {
            ui.label("No workouts logged yet.");
            return;
        }
        egui::ScrollArea::vertical().show(ui, |ui| {
            for (i, line) in lines.iter().enumerate() {
                let selected = self.selected_workout == Some(i);
                if ui.selectable_label(selected, line).clicked() {
                    self.selected_workout = if selected { None } else { Some(i) };
                }
            }
        });
    }

    fn types_window(&mut self, ctx: &egui::Context) {
        if !self.show_types {
            return;
        }
        let types: Vec<ExerciseType> = self
            .tracker
            .as_ref()
            .map(|t| t.registry().iter().collect())
            .unwrap_or_default();
        let mut open = self.show_types;
        egui::Window::new("Exercise Type Settings")
            .default_width(300.0)
            .open(&mut open)
            .resizable(true)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical()
                    .max_height(200.0)
                    .show(ui, |ui| {
                        for t in &types {
                            let selected = self.selected_type.as_deref() == Some(t.name.as_str());
                            if ui.selectable_label(selected, t.label()).clicked() {
                                self.selected_type = Some(t.name.clone());
                                self.type_name = t.name.clone();
                                self.type_unit = t.unit.clone();
                            }
                        }
                    });
                ui.separator();
                egui::Grid::new("type_fields").num_columns(2).show(ui, |ui| {
                    ui.label("Name:");
                    ui.text_edit_singleline(&mut self.type_name);
                    ui.end_row();
                    ui.label("Unit:");
                    ui.text_edit_singleline(&mut self.type_unit);
                    ui.end_row();
                });
                let filled =
                    !self.type_name.trim().is_empty() && !self.type_unit.trim().is_empty();
                let has_selection = self.selected_type.is_some();
                ui.horizontal(|ui| {
                    if ui
                        .add_enabled(filled, egui::Button::new("Add Exercise Type"))
                        .clicked()
                    {
                        self.add_type();
                    }
                    if ui
                        .add_enabled(filled && has_selection, egui::Button::new("Edit Exercise Type"))
                        .clicked()
                    {
                        self.save_type_edit();
                    }
                    if ui
                        .add_enabled(has_selection, egui::Button::new("Remove Exercise Type"))
                        .clicked()
                    {
                        self.confirm_remove = self.selected_type.clone();
                    }
                });
            });
        self.show_types = open;
    }

    fn confirm_window(&mut self, ctx: &egui::Context) {
        let Some(name) = self.confirm_remove.clone() else {
            return;
        };
        let mut answer = None;
        egui::Window::new("Confirm Deletion")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(format!("Are you sure you want to remove '{name}'?"));
                ui.horizontal(|ui| {
                    if ui.button("Yes").clicked() {
                        answer = Some(true);
                    }
                    if ui.button("No").clicked() {
                        answer = Some(false);
                    }
                });
            });
        match answer {
            Some(true) => {
                self.confirm_remove = None;
                self.remove_type(&name);
            }
            Some(false) => self.confirm_remove = None,
            None => {}
        }
    }

    fn chart_window(&mut self, ctx: &egui::Context) {
        if !self.show_chart {
            return;
        }
        let types = self.type_names();
        if self.chart_type.is_empty() {
            if let Some(first) = types.first() {
                self.set_chart_type(first.clone());
            }
        }
        let Some(series) = self
            .tracker
            .as_ref()
            .map(|t| t.chart_series(&self.chart_type))
        else {
            return;
        };
        let mut open = self.show_chart;
        let mut selected = self.chart_type.clone();
        let mut save_png = false;
        let width = self.settings.plot_width;
        let height = self.settings.plot_height;
        let show_markers = self.settings.show_markers;
        egui::Window::new("Chart")
            .default_width(width + 20.0)
            .open(&mut open)
            .resizable(true)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label("Select Exercise Type:");
                    egui::ComboBox::from_id_source("chart_type_combo")
                        .selected_text(selected.clone())
                        .show_ui(ui, |ui| {
                            for t in &types {
                                ui.selectable_value(&mut selected, t.clone(), t);
                            }
                        });
                    if ui.button("Save PNG").clicked() {
                        save_png = true;
                    }
                });
                for note in series.notes() {
                    ui.label(note);
                }
                ui.heading(series.title());
                Plot::new("workout_chart")
                    .width(width)
                    .height(height)
                    .x_axis_label("Date")
                    .y_axis_label("Amount")
                    .x_axis_formatter(|mark, _chars, _| {
                        chart::format_day(mark.value.round() as i32)
                    })
                    .legend(Legend::default().position(Corner::LeftTop))
                    .show(ui, |plot_ui| {
                        plot_ui.line(series.line());
                        if show_markers {
                            plot_ui.points(series.markers());
                        }
                    });
            });
        self.show_chart = open;
        if selected != self.chart_type {
            self.set_chart_type(selected);
        }
        if save_png {
            self.export_chart(&series);
        }
    }

    fn preferences_window(&mut self, ctx: &egui::Context) {
        if !self.show_preferences {
            return;
        }
        let mut open = self.show_preferences;
        let mut pick_dir = false;
        let current_dir = self.settings.data_dir();
        egui::Window::new("Preferences")
            .open(&mut open)
            .resizable(false)
            .show(ctx, |ui| {
                egui::Grid::new("prefs_grid").num_columns(2).show(ui, |ui| {
                    ui.label("Plot width:");
                    if ui
                        .add(egui::Slider::new(&mut self.settings.plot_width, 200.0..=1200.0))
                        .changed()
                    {
                        self.settings_dirty = true;
                    }
                    ui.end_row();
                    ui.label("Plot height:");
                    if ui
                        .add(egui::Slider::new(&mut self.settings.plot_height, 150.0..=900.0))
                        .changed()
                    {
                        self.settings_dirty = true;
                    }
                    ui.end_row();
                    ui.label("Point markers:");
                    if ui
                        .checkbox(&mut self.settings.show_markers, "Show")
                        .changed()
                    {
                        self.settings_dirty = true;
                    }
                    ui.end_row();
                    ui.label("Data directory:");
                    ui.horizontal(|ui| {
                        ui.label(current_dir.display().to_string());
                        if ui.button("Change...").clicked() {
                            pick_dir = true;
                        }
                    });
                    ui.end_row();
                });
            });
        self.show_preferences = open;
        if pick_dir {
            if let Some(dir) = FileDialog::new().set_directory(&current_dir).pick_folder() {
                self.settings.data_dir = Some(dir.display().to_string());
                self.settings_dirty = true;
                self.notify("The new data directory is used after a restart.", false);
            }
        }
    }

    fn show_notice(&mut self, ctx: &egui::Context) {
        let Some(notice) = &self.notice else {
            return;
        };
        if notice.start.elapsed() >= NOTICE_DURATION {
            self.notice = None;
            return;
        }
        egui::Area::new(egui::Id::new("notice"))
            .anchor(egui::Align2::RIGHT_BOTTOM, [-10.0, -10.0])
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    if notice.is_error {
                        ui.colored_label(egui::Color32::RED, &notice.text);
                    } else {
                        ui.label(&notice.text);
                    }
                });
            });
        ctx.request_repaint_after(Duration::from_millis(250));
    }
}

impl App for TrackerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        if let Some(err) = self.startup_error.clone() {
            egui::CentralPanel::default().show(ctx, |ui| {
                ui.heading("Your data could not be loaded");
                ui.add_space(8.0);
                ui.colored_label(egui::Color32::RED, err);
                ui.add_space(8.0);
                ui.label("Fix or move the file named above, then restart the application.");
                ui.label("Nothing has been written to disk.");
            });
            return;
        }

        self.menu_bar(ctx);
        egui::SidePanel::left("form_panel")
            .resizable(false)
            .show(ctx, |ui| self.form_panel(ui));
        egui::CentralPanel::default().show(ctx, |ui| self.workout_list(ui));

        self.types_window(ctx);
        self.confirm_window(ctx);
        self.chart_window(ctx);
        self.preferences_window(ctx);
        self.show_notice(ctx);

        if self.settings_dirty {
            self.settings.save();
            self.settings_dirty = false;
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.settings.save();
    }
}

fn main() -> eframe::Result<()> {
    env_logger::init();
    let options = NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([760.0, 420.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Fitness Tracker",
        options,
        Box::new(|_cc| Box::new(TrackerApp::default())),
    )
}
