use std::io::{self, Write};

fn main() {
    if let Err(err) = try_main() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn try_main() -> io::Result<()> {
    let mut tee_stderr = false;
    let mut echo_stdin = false;
    let mut echo_env = false;
    let mut exit_code = None;
    let mut stderr_lines = 0usize;
    let mut suicide = false;
    let mut print_cwd = false;

    let mut args = std::env::args().skip(1).peekable();
    while let Some(arg) = args.peek() {
        match arg.as_str() {
            "-e" => tee_stderr = true,
            "-i" => echo_stdin = true,
            "-$" => echo_env = true,
            "-s" => suicide = true,
            "-d" => print_cwd = true,
            "-x" => {
                args.next();
                exit_code = args.peek().and_then(|it| it.parse::<i32>().ok());
            }
            "-n" => {
                args.next();
                stderr_lines = args.peek().and_then(|it| it.parse().ok()).unwrap_or(0);
            }
            _ => break,
        }
        args.next();
    }

    let stdin = io::stdin();
    let stdout = io::stdout();
    let stderr = io::stderr();
    let mut stdin = stdin.lock();
    let mut stdout = stdout.lock();
    let mut stderr = stderr.lock();
    macro_rules! w {
        ($($tt:tt)*) => {
            write!(stdout, $($tt)*)?;
            if tee_stderr {
                write!(stderr, $($tt)*)?;
            }
        }
    }

    if print_cwd {
        w!("{}\n", std::env::current_dir()?.display());
    } else if echo_stdin {
        io::copy(&mut stdin, &mut stdout)?;
    } else if echo_env {
        for key in args {
            if let Some(v) = std::env::var_os(&key) {
                w!("{}={}\n", key, v.to_string_lossy());
            }
        }
    } else {
        let mut space = "";
        for arg in args {
            w!("{}{}", space, arg);
            space = " ";
        }
        w!("\n");
    }

    for i in 0..stderr_lines {
        writeln!(stderr, "line {i}")?;
    }

    if let Some(code) = exit_code {
        stdout.flush()?;
        writeln!(stderr, "xecho: exiting with {code}")?;
        std::process::exit(code);
    }
    if suicide {
        #[cfg(unix)]
        unsafe {
            let pid = signals::getpid();
            if pid > 0 {
                signals::kill(pid, 9);
            }
        }
    }

    Ok(())
}

#[cfg(unix)]
mod signals {
    use std::os::raw::c_int;
    extern "C" {
        pub fn kill(pid: c_int, sig: c_int) -> c_int;
        pub fn getpid() -> c_int;
    }
}
