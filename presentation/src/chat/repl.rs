//! REPL (Read-Eval-Print Loop) for interactive agent sessions

use crate::ConsoleFormatter;
use cadmate_application::{AgentManager, CadGateway, ContextEnricher};
use cadmate_domain::agent::AgentMode;
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RlResult};
use std::collections::HashMap;
use std::sync::Arc;

/// Interactive agent REPL
pub struct AgentRepl {
    manager: AgentManager,
    enricher: ContextEnricher,
}

impl AgentRepl {
    /// Create a new REPL over a manager. The gateway, when present, backs
    /// the `/context` command.
    pub fn new(manager: AgentManager, cad: Option<Arc<dyn CadGateway>>) -> Self {
        let limits = manager.settings().limits.clone();
        Self {
            manager,
            enricher: ContextEnricher::new(cad, limits),
        }
    }

    /// Run the interactive REPL
    pub async fn run(&mut self) -> RlResult<()> {
        let mut rl = DefaultEditor::new()?;

        // Try to load history
        let history_path = dirs::data_dir().map(|p| p.join("cadmate").join("history.txt"));

        if let Some(ref path) = history_path {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let _ = rl.load_history(path);
        }

        self.print_welcome();

        loop {
            let readline = rl.readline(">>> ");

            match readline {
                Ok(line) => {
                    let line = line.trim();

                    // Skip empty lines
                    if line.is_empty() {
                        continue;
                    }

                    // Handle commands
                    if line.starts_with('/') {
                        if self.handle_command(line).await {
                            break;
                        }
                        continue;
                    }

                    // Add to history
                    let _ = rl.add_history_entry(line);

                    self.process(line).await;
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("Bye!");
                    break;
                }
                Err(err) => {
                    eprintln!("Error: {:?}", err);
                    break;
                }
            }
        }

        // Save history
        if let Some(ref path) = history_path {
            let _ = rl.save_history(path);
        }

        Ok(())
    }

    fn print_welcome(&self) {
        println!();
        println!("╭─────────────────────────────────────────────╮");
        println!("│              Cadmate - CAD Agent            │");
        println!("╰─────────────────────────────────────────────╯");
        println!();
        println!("Mode: {}", self.manager.mode());
        println!();
        println!("Commands:");
        println!("  /help               - Show this help");
        println!("  /mode [chat|agent]  - Show or switch the operating mode");
        println!("  /approve [id]       - Approve and execute the pending plan");
        println!("  /reject [id] [why]  - Reject the pending plan");
        println!("  /status             - Show agent status");
        println!("  /tools              - List registered tools");
        println!("  /context            - Show the workspace snapshot");
        println!("  /history            - Show execution history");
        println!("  /pause /resume /stop - Control a running plan");
        println!("  /quit               - Exit");
        println!();
    }

    /// Handle slash commands. Returns true if should exit.
    async fn handle_command(&mut self, line: &str) -> bool {
        let mut parts = line.split_whitespace();
        let command = parts.next().unwrap_or("");
        let args: Vec<&str> = parts.collect();

        match command {
            "/quit" | "/exit" | "/q" => {
                println!("Bye!");
                return true;
            }
            "/help" | "/h" | "/?" => {
                self.print_welcome();
            }
            "/mode" => match args.first() {
                None => println!("Mode: {}", self.manager.mode()),
                Some(&"chat") => {
                    self.manager.set_mode(AgentMode::Chat);
                    println!("Switched to chat mode.");
                }
                Some(&"agent") => {
                    self.manager.set_mode(AgentMode::Agent);
                    println!("Switched to agent mode.");
                }
                Some(other) => println!("Unknown mode: {} (chat or agent)", other),
            },
            "/approve" => {
                let Some(plan_id) = self.resolve_plan_id(args.first().copied()) else {
                    println!("No pending plan to approve.");
                    return false;
                };
                let response = self.manager.approve_plan(&plan_id).await;
                println!("{}", ConsoleFormatter::format(&response));
            }
            "/reject" => {
                let (id_arg, feedback) = match args.split_first() {
                    Some((first, rest)) if first.starts_with("plan-") => {
                        (Some(*first), rest.join(" "))
                    }
                    Some(_) => (None, args.join(" ")),
                    None => (None, String::new()),
                };
                let Some(plan_id) = self.resolve_plan_id(id_arg) else {
                    println!("No pending plan to reject.");
                    return false;
                };
                let feedback = (!feedback.is_empty()).then_some(feedback.as_str());
                let response = self.manager.reject_plan(&plan_id, feedback);
                println!("{}", ConsoleFormatter::format(&response));
            }
            "/status" => {
                println!("{}", ConsoleFormatter::format_status(&self.manager.get_status()));
            }
            "/tools" => {
                let tools = self.manager.get_status().available_tools;
                if tools.is_empty() {
                    println!("No tools registered.");
                } else {
                    println!();
                    for tool in tools {
                        println!("  - {}", tool);
                    }
                    println!();
                }
            }
            "/context" => {
                let context = self.enricher.enrich(HashMap::new()).await;
                println!("{}", ConsoleFormatter::format_context(&context));
            }
            "/history" => {
                println!("{}", ConsoleFormatter::format_history(self.manager.history()));
            }
            "/pause" => {
                self.manager.pause();
                println!("Paused.");
            }
            "/resume" => {
                self.manager.resume();
                println!("Resumed.");
            }
            "/stop" => {
                self.manager.stop();
                println!("Stopped.");
            }
            _ => {
                println!("Unknown command: {}", command);
                println!("Type /help for available commands");
            }
        }
        false
    }

    /// Explicit id wins; otherwise fall back to the pending plan.
    fn resolve_plan_id(&self, arg: Option<&str>) -> Option<String> {
        match arg {
            Some(id) => Some(id.to_string()),
            None => self.manager.get_status().pending_plan,
        }
    }

    async fn process(&mut self, line: &str) {
        println!();
        let response = self.manager.process_message(line, HashMap::new()).await;
        println!("{}", ConsoleFormatter::format(&response));
    }
}
