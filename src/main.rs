// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Proteus CLI entrypoint.
//!
//! Loads a flat session file (or the built-in demo session) into a shared
//! document, drives the reconciliation engine against in-memory
//! collaborators, and serves the advanced-link metadata plus the current
//! session export over HTTP at `http://127.0.0.1:<port>`.
//!
//! Use `--export <path>` to write the recomposed session file and exit.

use std::error::Error;
use std::sync::Arc;

use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::routing::get;
use axum::{Json, Router};

use proteus::backend::memory::{MemoryDataAccess, MemoryLinkEngine, MemoryPlotBackend};
use proteus::doc::SharedDocument;
use proteus::query::{advanced_links_response, AdvancedLinksResponse};
use proteus::session::SharedSession;
use proteus::store::{SessionFile, WriteDurability};

const DEFAULT_HTTP_PORT: u16 = 27461;

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [<session-file>] [--durable-writes] [--http-port <port>]\n  {program} [--session <file>] [--durable-writes] [--http-port <port>]\n  {program} --demo [--http-port <port>]\n  {program} [<session-file>|--demo] --export <path>\n\nServes the advanced-link metadata at `http://127.0.0.1:<port>/advanced-links`\nand the current session export at `/session`.\n--http-port selects the port (default {DEFAULT_HTTP_PORT}).\n\n--demo uses a built-in demo session and cannot be combined with a session file.\n--export writes the recomposed session file to <path> and exits.\n\n--durable-writes opts into slower, best-effort durable persistence (fsync/sync where supported)."
    );
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct CliOptions {
    demo: bool,
    session_file: Option<String>,
    export: Option<String>,
    http_port: Option<u16>,
    durable_writes: bool,
}

fn parse_options(mut args: impl Iterator<Item = String>) -> Result<CliOptions, ()> {
    let mut options = CliOptions::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--demo" => {
                if options.demo {
                    return Err(());
                }
                options.demo = true;
            }
            "--session" => {
                if options.session_file.is_some() {
                    return Err(());
                }
                let file = args.next().ok_or(())?;
                options.session_file = Some(file);
            }
            "--export" => {
                if options.export.is_some() {
                    return Err(());
                }
                let path = args.next().ok_or(())?;
                options.export = Some(path);
            }
            "--http-port" => {
                if options.http_port.is_some() {
                    return Err(());
                }
                let raw = args.next().ok_or(())?;
                let port: u16 = raw.parse().map_err(|_| ())?;
                options.http_port = Some(port);
            }
            "--durable-writes" => {
                if options.durable_writes {
                    return Err(());
                }
                options.durable_writes = true;
            }
            _ if arg.starts_with('-') => return Err(()),
            _ => {
                if options.session_file.is_some() {
                    return Err(());
                }
                options.session_file = Some(arg);
            }
        }
    }

    if options.demo && options.session_file.is_some() {
        return Err(());
    }

    if !options.demo && options.session_file.is_none() {
        return Err(());
    }

    Ok(options)
}

async fn advanced_links_handler() -> Json<AdvancedLinksResponse> {
    Json(advanced_links_response())
}

async fn session_handler(
    State(document): State<Arc<SharedDocument>>,
) -> ([(axum::http::HeaderName, &'static str); 1], String) {
    ([(CONTENT_TYPE, "application/json")], document.get())
}

fn main() {
    let result = (|| -> Result<(), Box<dyn Error>> {
        let mut args = std::env::args();
        let program = args.next().unwrap_or_else(|| "proteus".to_owned());

        let options = match parse_options(args) {
            Ok(options) => options,
            Err(()) => {
                print_usage(&program);
                std::process::exit(2);
            }
        };

        let durability = if options.durable_writes {
            WriteDurability::Durable
        } else {
            WriteDurability::BestEffort
        };

        let session = SharedSession::new(
            Box::new(MemoryPlotBackend::new()),
            Box::new(MemoryDataAccess::new()),
            Box::new(MemoryLinkEngine::new()),
        );

        let text = if options.demo {
            proteus::model::fixtures::demo_session_text()
        } else {
            let file = options.session_file.clone().expect("session file checked");
            SessionFile::new(file).load()?
        };
        session.load_session(&text)?;

        for warning in session.take_warnings() {
            eprintln!("proteus: {warning}");
        }

        if let Some(export) = options.export {
            SessionFile::new(export)
                .with_durability(durability)
                .save(&session.export_session())?;
            return Ok(());
        }

        let http_port = options.http_port.unwrap_or(DEFAULT_HTTP_PORT);
        let document = Arc::clone(session.document());

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::bind(("127.0.0.1", http_port)).await?;
            let address = listener.local_addr()?;
            eprintln!("proteus: serving session metadata at http://{address}");

            let router = Router::new()
                .route("/advanced-links", get(advanced_links_handler))
                .route("/session", get(session_handler))
                .with_state(document);

            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = tokio::signal::ctrl_c().await;
                })
                .await?;

            Ok::<(), Box<dyn Error>>(())
        })?;

        drop(session);
        Ok(())
    })();

    if let Err(err) = result {
        eprintln!("proteus: {err}");
        std::process::exit(1);
    }
}
