// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! wxdispatch CLI
//!
//! Sends one request through the dispatcher and prints what came back.

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context};
use wxdispatch::{ApiRequest, BaseResponse, Dispatcher};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("wxdispatch=info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        return ExitCode::from(1);
    }

    let result = match args[1].as_str() {
        "get" | "post" | "post-json" => {
            if args.len() < 3 {
                eprintln!("Usage: wxdispatch {} <url> [key=value ...]", args[1]);
                return ExitCode::from(1);
            }
            send(&args[1], &args[2], &args[3..]).await
        }
        "upload" => {
            if args.len() < 5 {
                eprintln!("Usage: wxdispatch upload <url> <field> <file> [key=value ...]");
                return ExitCode::from(1);
            }
            upload(&args[2], &args[3], &args[4], &args[5..]).await
        }
        "download" => {
            if args.len() < 4 {
                eprintln!("Usage: wxdispatch download <url> <path>");
                return ExitCode::from(1);
            }
            download(&args[2], &args[3]).await
        }
        "--help" | "-h" | "help" => {
            print_usage();
            return ExitCode::SUCCESS;
        }
        "--version" | "-v" | "version" => {
            println!("wxdispatch {}", wxdispatch::VERSION);
            return ExitCode::SUCCESS;
        }
        cmd => {
            eprintln!("Unknown command: {}", cmd);
            print_usage();
            return ExitCode::from(1);
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

fn print_usage() {
    println!(
        r#"wxdispatch - HTTP dispatcher for web-bot API clients

USAGE:
    wxdispatch <COMMAND> [ARGS]

COMMANDS:
    get <url> [key=value ...]                   Send a GET, parameters go into the query
    post <url> [key=value ...]                  Send a form-encoded POST
    post-json <url> [key=value ...]             Send a POST with a JSON object body
    upload <url> <field> <file> [key=value ...] Send a multipart POST with one file part
    download <url> <path>                       Stream a response body into a file
    help                                        Show this help message
    version                                     Show version information

EXAMPLES:
    wxdispatch get https://login.wx.qq.com/jslogin appid=wx782c26e4c19acffb fun=new
    wxdispatch post-json https://wx.qq.com/cgi-bin/mmwebwx-bin/webwxinit r=1
    wxdispatch download https://login.weixin.qq.com/qrcode/abc qr.jpg

Set RUST_LOG=wxdispatch=debug to see request URLs and bodies.
"#
    );
}

fn parse_params(args: &[String]) -> anyhow::Result<Vec<(String, String)>> {
    args.iter()
        .map(|arg| match arg.split_once('=') {
            Some((k, v)) if !k.is_empty() => Ok((k.to_string(), v.to_string())),
            _ => bail!("expected key=value, got '{}'", arg),
        })
        .collect()
}

async fn send(command: &str, url: &str, params: &[String]) -> anyhow::Result<()> {
    let dispatcher = Dispatcher::new().context("failed to create dispatcher")?;

    let mut request = match command {
        "get" => ApiRequest::<BaseResponse>::get(url),
        "post-json" => ApiRequest::post(url).json_body(),
        _ => ApiRequest::post(url),
    }
    .params(parse_params(params)?);

    let response = dispatcher.send(&mut request).await?;

    println!("=== Response ===");
    println!("URL: {}", request.url);
    println!("Status: {}", response.status);
    println!("{}", response.raw_body);
    print_cookies(&dispatcher);

    Ok(())
}

async fn upload(url: &str, field: &str, file: &str, params: &[String]) -> anyhow::Result<()> {
    let dispatcher = Dispatcher::new().context("failed to create dispatcher")?;
    let path = PathBuf::from(file);
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("'{}' has no file name", file))?;

    let mut request = ApiRequest::<BaseResponse>::post(url)
        .params(parse_params(params)?)
        .param(field, path)
        .multipart(file_name, wxdispatch::http::DEFAULT_FILE_CONTENT_TYPE);

    let response = dispatcher.send(&mut request).await?;

    println!("=== Response ===");
    println!("Status: {}", response.status);
    println!("{}", response.raw_body);
    print_cookies(&dispatcher);

    Ok(())
}

async fn download(url: &str, path: &str) -> anyhow::Result<()> {
    let dispatcher = Dispatcher::new().context("failed to create dispatcher")?;

    let mut request = ApiRequest::<BaseResponse>::get(url);
    let file = dispatcher.download(&mut request).await?;

    println!("Status: {}", file.status);
    if let Some(content_type) = file.content_type() {
        println!("Content-Type: {}", content_type);
    }

    let written = file
        .save_to(path)
        .await
        .with_context(|| format!("failed to save to {}", path))?;
    println!("Saved {} bytes to {}", written, path);

    Ok(())
}

fn print_cookies(dispatcher: &Dispatcher) {
    let cookies = dispatcher.cookies();
    if cookies.is_empty() {
        return;
    }

    println!("\n=== Cookies ({}) ===", cookies.len());
    for cookie in &cookies {
        println!("  {} = {} ({})", cookie.name, cookie.value, cookie.host);
    }
}
