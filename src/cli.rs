//! Interactive CLI standing in for the original page actions: every command
//! maps to a form submit or button click on the static site.

use crate::forum::{LikeTarget, NewThread};
use crate::portal::Portal;
use crate::audit::AuditFile;
use crate::contact::NewContact;
use crate::donations::NewDonation;
use crate::error::PortalError;
use crate::session::SignupInput;
use crate::store::collection::RecordId;
use crate::store::models::{AccountType, Category};
use crate::timer;
use anyhow::Result;
use std::io::{self, Write};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn run_cli(portal: Portal) -> Result<()> {
    let mut session = CliSession { portal };

    println!("Synergy portal CLI ready. Type 'help' for a list of commands.");

    let stdin = tokio::io::stdin();
    let mut reader = BufReader::new(stdin);

    loop {
        print!("synergy> ");
        io::stdout().flush()?;

        let mut line = String::new();
        let read = reader.read_line(&mut line).await?;
        if read == 0 {
            println!("Exiting");
            break;
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let tokens = match shell_words::split(trimmed) {
            Ok(tokens) if !tokens.is_empty() => tokens,
            Ok(_) => continue,
            Err(err) => {
                println!("Unable to parse command: {err}");
                continue;
            }
        };

        let command = tokens[0].as_str();
        let args = &tokens[1..];
        let outcome = match command {
            "help" => {
                print_help();
                Ok(())
            }
            "exit" | "quit" => break,
            "signup" => session.signup(args),
            "login" => session.login(args),
            "logout" => session.logout(),
            "switch" => session.switch_account(),
            "whoami" => session.whoami(),
            "threads" => session.list_threads(),
            "thread" => session.view_thread(args),
            "post" => session.post_thread(args),
            "reply" => session.reply(args),
            "like" => session.like(args),
            "search" => session.search(args),
            "progress" => session.progress(args),
            "download" => session.download(args).await,
            "enroll" => session.enroll(args),
            "donate" => session.donate(args).await,
            "contact" => session.contact(args),
            "audit" => session.show_audit(args),
            other => {
                println!("Unknown command '{other}'. Type 'help' for options.");
                Ok(())
            }
        };

        if let Err(err) = outcome {
            println!("{err}");
        }
    }

    Ok(())
}

fn print_help() {
    println!("Commands:");
    println!("  signup <username> <password> <first> <last> [student|lecturer] [dob]");
    println!("  login <username> <password>");
    println!("  logout | switch | whoami");
    println!("  threads");
    println!("  thread <id>");
    println!("  post <category> <title> <content...>");
    println!("  reply <thread-id> <content...>");
    println!("  like <thread-id> [reply-id]");
    println!("  search <term...>");
    println!("  progress <subject> <percent>");
    println!("  download <resource> [type]");
    println!("  enroll <course> [level]");
    println!("  donate <amount> <btc-address> [name] [email]");
    println!("  contact <name> <email> <subject> <message...>");
    println!("  audit <file>");
    println!("  exit");
}

struct CliSession {
    portal: Portal,
}

impl CliSession {
    fn signup(&mut self, args: &[String]) -> Result<(), PortalError> {
        if args.len() < 4 {
            println!("Usage: signup <username> <password> <first> <last> [student|lecturer] [dob]");
            return Ok(());
        }
        let account_type = match args.get(4).map(String::as_str) {
            Some("lecturer") => AccountType::Lecturer,
            _ => AccountType::Student,
        };
        let user = self.portal.sessions().signup(SignupInput {
            username: args[0].clone(),
            password: args[1].clone(),
            first_name: args[2].clone(),
            last_name: args[3].clone(),
            account_type,
            dob: args.get(5).cloned().unwrap_or_default(),
        })?;
        println!("Account created successfully! Logged in as {}", user.username);
        Ok(())
    }

    fn login(&mut self, args: &[String]) -> Result<(), PortalError> {
        if args.len() != 2 {
            println!("Usage: login <username> <password>");
            return Ok(());
        }
        let user = self.portal.sessions().login(&args[0], &args[1])?;
        println!("Login successful! Welcome back, {}.", user.first_name);
        Ok(())
    }

    fn logout(&mut self) -> Result<(), PortalError> {
        self.portal.sessions().logout()?;
        println!("Logged out successfully");
        Ok(())
    }

    fn switch_account(&mut self) -> Result<(), PortalError> {
        self.portal.sessions().switch_account()?;
        println!("Session cleared. Use 'login' or 'signup' to continue.");
        Ok(())
    }

    fn whoami(&self) -> Result<(), PortalError> {
        match self.portal.sessions().current() {
            Some(user) => println!(
                "{} {} ({}, {:?})",
                user.first_name, user.last_name, user.username, user.account_type
            ),
            None => println!("Not logged in"),
        }
        Ok(())
    }

    fn list_threads(&self) -> Result<(), PortalError> {
        let threads = self.portal.forum().list_threads();
        if threads.is_empty() {
            println!("No threads yet. Start one with 'post'.");
            return Ok(());
        }
        for thread in threads {
            let id = thread
                .id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "?".to_string());
            println!(
                "[{id}] {} ({}) by {} | {} replies, {} views, {} likes",
                thread.title, thread.category, thread.author, thread.replies, thread.views,
                thread.likes
            );
        }
        Ok(())
    }

    fn view_thread(&self, args: &[String]) -> Result<(), PortalError> {
        let Some(id) = args.first() else {
            println!("Usage: thread <id>");
            return Ok(());
        };
        let id = parse_id(id);
        self.portal.forum().increment_view(&id)?;
        let thread = self
            .portal
            .forum()
            .get_thread(&id)
            .ok_or_else(|| PortalError::NotFound("thread".to_string()))?;

        println!("{} ({})", thread.title, thread.category);
        println!("by {} on {}", thread.author, thread.date);
        if !thread.tags.is_empty() {
            println!("tags: {}", thread.tags.join(", "));
        }
        println!("{}\n", thread.content);
        for reply in self.portal.forum().replies(&id) {
            let reply_id = reply
                .id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "?".to_string());
            println!(
                "  #{reply_id} {} ({} likes): {}",
                reply.author, reply.likes, reply.content
            );
        }
        Ok(())
    }

    fn post_thread(&mut self, args: &[String]) -> Result<(), PortalError> {
        if args.len() < 3 {
            println!("Usage: post <category> <title> <content...>");
            return Ok(());
        }
        let author = self.author();
        let thread = self.portal.forum().create_thread(NewThread {
            category: Category::from(args[0].clone()),
            title: args[1].clone(),
            content: args[2..].join(" "),
            author,
        })?;
        let id = thread
            .id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "?".to_string());
        println!("Thread created successfully (id {id})");
        Ok(())
    }

    fn reply(&mut self, args: &[String]) -> Result<(), PortalError> {
        if args.len() < 2 {
            println!("Usage: reply <thread-id> <content...>");
            return Ok(());
        }
        let author = self.author();
        let thread_id = parse_id(&args[0]);
        let reply = self
            .portal
            .forum()
            .add_reply(&thread_id, &args[1..].join(" "), &author)?;
        let reply_id = reply
            .id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "?".to_string());
        println!("Reply posted successfully (#{reply_id})");
        Ok(())
    }

    fn like(&mut self, args: &[String]) -> Result<(), PortalError> {
        let Some(thread_id) = args.first() else {
            println!("Usage: like <thread-id> [reply-id]");
            return Ok(());
        };
        let username = match self.portal.sessions().current() {
            Some(user) => user.username,
            None => {
                println!("You must be logged in to like posts");
                return Ok(());
            }
        };
        let target = match args.get(1) {
            Some(reply_id) => LikeTarget::Reply {
                thread_id: parse_id(thread_id),
                reply_id: parse_reply_id(reply_id),
            },
            None => LikeTarget::Thread(parse_id(thread_id)),
        };
        let liked = self.portal.forum().toggle_like(&target, &username)?;
        println!("{}", if liked { "Post liked" } else { "Like removed" });
        Ok(())
    }

    fn search(&self, args: &[String]) -> Result<(), PortalError> {
        if args.is_empty() {
            println!("Usage: search <term...>");
            return Ok(());
        }
        let term = args.join(" ");
        let results = self.portal.forum().search(&term);
        if results.is_empty() {
            println!("No threads found matching your search.");
            return Ok(());
        }
        println!("Search results for \"{term}\":");
        for thread in results {
            let id = thread
                .id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "?".to_string());
            println!("[{id}] {}", thread.title);
        }
        Ok(())
    }

    fn progress(&mut self, args: &[String]) -> Result<(), PortalError> {
        if args.len() != 2 {
            println!("Usage: progress <subject> <percent>");
            return Ok(());
        }
        let Ok(percent) = args[1].parse::<u8>() else {
            println!("Percent must be a number between 0 and 100");
            return Ok(());
        };
        let user = self.portal.dashboard().update_progress(&args[0], percent)?;
        println!(
            "{} progress set to {}%",
            args[0],
            user.progress.get(&args[0]).copied().unwrap_or(0)
        );
        Ok(())
    }

    async fn download(&mut self, args: &[String]) -> Result<(), PortalError> {
        let Some(resource) = args.first() else {
            println!("Usage: download <resource> [type]");
            return Ok(());
        };
        let kind = args.get(1).cloned().unwrap_or_else(|| "pdf".to_string());
        println!("Downloading {resource}...");
        self.portal.dashboard().record_download(resource, &kind)?;

        let resource = resource.clone();
        timer::defer(Duration::from_secs(2), move || {
            println!("{resource} downloaded successfully!");
        })
        .finished()
        .await;
        Ok(())
    }

    fn enroll(&mut self, args: &[String]) -> Result<(), PortalError> {
        let Some(course) = args.first() else {
            println!("Usage: enroll <course> [level]");
            return Ok(());
        };
        let level = args.get(1).cloned().unwrap_or_else(|| "beginner".to_string());
        self.portal.dashboard().enroll(course, &level)?;
        println!("Successfully enrolled in {course}!");
        Ok(())
    }

    async fn donate(&mut self, args: &[String]) -> Result<(), PortalError> {
        if args.len() < 2 {
            println!("Usage: donate <amount> <btc-address> [name] [email]");
            return Ok(());
        }
        println!("Processing...");
        self.portal.donations().record(NewDonation {
            amount: args[0].clone(),
            bitcoin_address: args[1].clone(),
            donor_name: args.get(2).cloned(),
            donor_email: args.get(3).cloned(),
            anonymous: args.get(2).is_none(),
            newsletter: false,
        })?;

        timer::defer(Duration::from_secs(2), || {
            println!("Thank you for your donation! We appreciate your support.");
        })
        .finished()
        .await;
        Ok(())
    }

    fn contact(&mut self, args: &[String]) -> Result<(), PortalError> {
        if args.len() < 4 {
            println!("Usage: contact <name> <email> <subject> <message...>");
            return Ok(());
        }
        self.portal.contact().submit(NewContact {
            name: args[0].clone(),
            email: args[1].clone(),
            phone: None,
            subject: args[2].clone(),
            message: args[3..].join(" "),
        })?;
        println!("Thank you for your message! We will get back to you within 24 hours.");
        Ok(())
    }

    fn show_audit(&self, args: &[String]) -> Result<(), PortalError> {
        let Some(slug) = args.first() else {
            println!("Usage: audit <file> (e.g. student_progress, donations, user_actions)");
            return Ok(());
        };
        let file = audit_file(slug);
        match self.portal.audit().read(&file) {
            Some(blob) => println!("{blob}"),
            None => println!("No entries for {slug}"),
        }
        Ok(())
    }

    fn author(&self) -> String {
        self.portal
            .sessions()
            .current()
            .map(|user| user.username)
            .unwrap_or_else(|| "guest".to_string())
    }
}

// Thread ids are stored as time-based strings even when they look numeric.
fn parse_id(raw: &str) -> RecordId {
    RecordId::Text(raw.to_string())
}

// Reply ids are small sequential integers.
fn parse_reply_id(raw: &str) -> RecordId {
    raw.parse::<i64>()
        .map(RecordId::Number)
        .unwrap_or_else(|_| RecordId::Text(raw.to_string()))
}

fn audit_file(slug: &str) -> AuditFile {
    match slug {
        "student_progress" => AuditFile::StudentProgress,
        "user_events" => AuditFile::UserEvents,
        "download_history" => AuditFile::DownloadHistory,
        "course_enrollments" => AuditFile::CourseEnrollments,
        "event_registrations" => AuditFile::EventRegistrations,
        "chat_history" => AuditFile::ChatHistory,
        "user_actions" => AuditFile::UserActions,
        "general_forms" => AuditFile::GeneralForms,
        "donations" => AuditFile::Donations,
        other => AuditFile::Custom(other.to_string()),
    }
}
