use clap::{crate_version, Parser, Subcommand};
use std::error::Error;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[cfg(feature = "gui")]
use eframe::egui;
#[cfg(feature = "gui")]
use std::sync::mpsc::{channel, Receiver};
#[cfg(feature = "gui")]
use std::time::{Duration, Instant};
#[cfg(feature = "gui")]
use tracing::warn;

#[cfg(feature = "gui")]
use padboard::{AudioOutput, KeyboardListener, PadBoard, PadEvent};
use padboard::{audio, midi_note_name, Kit, MidiInputDevice, NoteMap, Settings};

#[derive(Parser)]
#[clap(
    version = crate_version!(),
    about = "A nine-pad drum machine."
)]
struct Cli {
    /// Path to a YAML settings file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory to read pad samples from. Overrides the settings file.
    #[arg(short, long)]
    samples_dir: Option<PathBuf>,

    #[clap(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Opens the pad board window.
    Run {},
    /// Lists the pads with their keys, MIDI notes and sample files.
    Pads {},
    /// Lists the available audio output devices.
    Devices {},
    /// Lists the available MIDI input ports.
    MidiDevices {},
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(samples_dir) = cli.samples_dir {
        settings.set_samples_dir(samples_dir);
    }

    match cli.command.unwrap_or(Commands::Run {}) {
        Commands::Run {} => run(settings)?,
        Commands::Pads {} => {
            let kit = Kit::default();
            let notes = NoteMap::new(settings.midi_base_note(), kit.len());
            println!("Pads (samples in {}):", settings.samples_dir().display());
            for (index, pad) in kit.pads().iter().enumerate() {
                let note = notes
                    .note_for(index)
                    .map(|n| format!("{} ({})", n, midi_note_name(n)))
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "- {} {:<12} note {:<10} {}",
                    pad.trigger_key,
                    pad.label,
                    note,
                    audio::loader::resolve_source(settings.samples_dir(), pad.audio_source).display()
                );
            }
        }
        Commands::Devices {} => {
            let devices = audio::list_output_devices()?;
            if devices.is_empty() {
                println!("No audio output devices found.");
                return Ok(());
            }
            println!("Audio output devices:");
            for device in devices {
                println!("- {}", device);
            }
        }
        Commands::MidiDevices {} => {
            let ports = MidiInputDevice::available_ports();
            if ports.is_empty() {
                println!("No MIDI input ports found.");
                return Ok(());
            }
            println!("MIDI input ports:");
            for port in ports {
                println!("- {}", port);
            }
        }
    }

    Ok(())
}

#[cfg(feature = "gui")]
fn run(settings: Settings) -> Result<(), Box<dyn Error>> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(settings.window_size())
            .with_title("PADBOARD - Drum Machine"),
        ..Default::default()
    };

    eframe::run_native(
        "PADBOARD",
        options,
        Box::new(move |_cc| Ok(Box::new(PadBoardApp::new(&settings)))),
    )?;
    Ok(())
}

#[cfg(not(feature = "gui"))]
fn run(_settings: Settings) -> Result<(), Box<dyn Error>> {
    eprintln!("This command requires the 'gui' feature to be enabled");
    std::process::exit(1);
}

#[cfg(feature = "gui")]
struct PadBoardApp {
    board: PadBoard<AudioOutput>,
    keyboard: KeyboardListener,
    midi_input: MidiInputDevice,
    midi_events: Receiver<PadEvent>,
    note_map: NoteMap,
}

#[cfg(feature = "gui")]
impl PadBoardApp {
    fn new(settings: &Settings) -> Self {
        let kit = Kit::default();
        let player = AudioOutput::open_or_silent(&kit, settings.samples_dir(), settings.volume());

        let mut keyboard = KeyboardListener::new(kit);
        keyboard.attach();

        let (sender, midi_events) = channel();
        let mut midi_input = MidiInputDevice::new();
        if let Some(port) = settings.midi_input() {
            if let Err(e) = midi_input.connect(port, sender) {
                warn!(port, err = %e, "MIDI input unavailable");
            }
        }

        Self {
            board: PadBoard::new(kit, player, settings.debounce()),
            keyboard,
            midi_input,
            midi_events,
            note_map: NoteMap::new(settings.midi_base_note(), kit.len()),
        }
    }

    fn handle_keyboard(&mut self, ctx: &egui::Context) {
        let keys: Vec<char> = ctx.input(|i| {
            i.events
                .iter()
                .filter_map(|event| match event {
                    egui::Event::Key {
                        key,
                        pressed: true,
                        repeat: false,
                        ..
                    } => self.keyboard.key_pressed(key.name()),
                    _ => None,
                })
                .collect()
        });

        let now = Instant::now();
        for key in keys {
            self.board.request_trigger(key, now);
        }
    }

    fn handle_midi_events(&mut self) {
        let now = Instant::now();
        while let Ok(PadEvent::Pressed(note, _velocity)) = self.midi_events.try_recv() {
            let key = self
                .note_map
                .index_for(note)
                .and_then(|index| self.board.kit().get(index))
                .map(|pad| pad.trigger_key);
            if let Some(key) = key {
                self.board.request_trigger(key, now);
            }
        }
    }

    fn schedule_repaint(&self, ctx: &egui::Context) {
        let kit = self.board.kit();
        if let Some(deadline) = self.board.next_deadline() {
            ctx.request_repaint_after(deadline.saturating_duration_since(Instant::now()));
        } else if self.midi_input.is_connected()
            || (0..kit.len()).any(|index| self.board.is_playing(index))
        {
            ctx.request_repaint_after(Duration::from_millis(16));
        }
    }
}

#[cfg(feature = "gui")]
impl eframe::App for PadBoardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_keyboard(ctx);
        self.handle_midi_events();
        self.board.poll(Instant::now());

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("PADBOARD - Drum Machine");
            ui.add_space(10.0);

            // Display
            egui::Frame::dark_canvas(ui.style())
                .inner_margin(egui::Margin::same(8.0))
                .show(ui, |ui| {
                    ui.set_min_width(ui.available_width());
                    ui.label(egui::RichText::new(self.board.display()).size(24.0).monospace());
                });

            ui.add_space(20.0);

            // Pad grid
            let kit = *self.board.kit();
            for row in kit.rows(padboard::pads::GRID_WIDTH) {
                ui.horizontal(|ui| {
                    for (index, pad) in row {
                        let is_playing = self.board.is_playing(index);
                        let button = egui::Button::new(
                            egui::RichText::new(pad.trigger_key.to_string()).size(28.0),
                        )
                        .min_size(egui::vec2(110.0, 90.0))
                        .fill(if is_playing {
                            egui::Color32::from_rgb(100, 200, 100)
                        } else {
                            egui::Color32::from_rgb(40, 40, 40)
                        });

                        let response = ui.add(button).on_hover_text(pad.label);
                        response.widget_info(|| {
                            egui::WidgetInfo::labeled(egui::WidgetType::Button, true, pad.label)
                        });

                        if response.clicked() {
                            self.board.request_trigger(pad.trigger_key, Instant::now());
                        }
                    }
                });
            }

            // Info
            ui.separator();
            ui.label("Click a pad or press its key");
            if !self.board.player().has_output() {
                ui.colored_label(
                    egui::Color32::YELLOW,
                    "⚠ No audio output available - pads are silent",
                );
            }
            if self.midi_input.is_connected() {
                ui.label(format!(
                    "MIDI pads from note {}",
                    midi_note_name(self.note_map.note_for(0).unwrap_or(0))
                ));
            }
        });

        self.schedule_repaint(ctx);
    }
}

#[cfg(feature = "gui")]
impl Drop for PadBoardApp {
    fn drop(&mut self) {
        self.midi_input.disconnect();
    }
}
