use std::io::{self, Write};

use anyhow::Result;
use bat::WrappingMode;
use chatguard::models::message::Message;
use chatguard::models::role::Role;
use cliclack::{input, spinner};
use console::style;

use super::{Prompt, Theme};

pub struct CliclackPrompt {
    spinner: Option<cliclack::ProgressBar>,
    theme: Theme,
}

impl Default for CliclackPrompt {
    fn default() -> Self {
        Self::new()
    }
}

impl CliclackPrompt {
    pub fn new() -> Self {
        CliclackPrompt {
            spinner: None,
            theme: Theme::Dark,
        }
    }

    fn theme_name(&self) -> &'static str {
        match self.theme {
            Theme::Light => "GitHub",
            Theme::Dark => "zenburn",
        }
    }
}

fn print(content: &str, theme: &str) {
    let printed = bat::PrettyPrinter::new()
        .input(bat::Input::from_bytes(content.as_bytes()))
        .theme(theme)
        .language("Markdown")
        .wrapping_mode(WrappingMode::Character)
        .print();
    if printed.is_err() {
        println!("{}", content);
    }
}

impl Prompt for CliclackPrompt {
    fn render(&mut self, message: &Message) {
        let theme = self.theme_name();
        match message.role {
            Role::Assistant => {
                println!("{}", style("Assistant's Response").bold());
                print(&message.content, theme);
            }
            Role::User => print(&format!("> {}", message.content), theme),
        }
        println!();
        let _ = io::stdout().flush();
    }

    fn render_markdown(&mut self, text: &str) {
        print(text, self.theme_name());
        println!();
    }

    fn render_notice(&mut self, text: &str) {
        let _ = cliclack::log::info(text);
    }

    fn render_warning(&mut self, text: &str) {
        let _ = cliclack::log::warning(text);
    }

    fn render_error(&mut self, text: &str) {
        let _ = cliclack::log::error(text);
    }

    fn get_input(&mut self) -> Result<String> {
        let message_text: String = input("Message:")
            .placeholder("")
            .required(false)
            .multiline()
            .interact()?;
        if message_text.trim().eq_ignore_ascii_case("/t") {
            self.theme = match self.theme {
                Theme::Light => Theme::Dark,
                Theme::Dark => Theme::Light,
            };
            return self.get_input();
        }
        Ok(message_text)
    }

    fn show_busy(&mut self) {
        let spin = spinner();
        spin.start("awaiting reply");
        self.spinner = Some(spin);
    }

    fn hide_busy(&mut self) {
        if let Some(spin) = self.spinner.take() {
            spin.stop("");
        }
    }

    fn close(&self) {
        let _ = cliclack::outro(style("session closed, conversation discarded").dim());
    }
}
