use std::io;
use std::thread;
use std::time::Duration;

fn main() {
    if let Err(err) = try_main() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

/// `xsleep [-f] <millis>`: sleeps, then prints `done`, or fails with `-f`.
fn try_main() -> io::Result<()> {
    let mut fail = false;

    let mut args = std::env::args().skip(1).peekable();
    if args.peek().map(String::as_str) == Some("-f") {
        fail = true;
        args.next();
    }

    let millis: u64 = match args.next() {
        Some(arg) => arg.parse().map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidInput, "invalid number of milliseconds")
        })?,
        None => 0,
    };
    thread::sleep(Duration::from_millis(millis));

    if fail {
        return Err(io::Error::new(io::ErrorKind::Other, "xsleep: failing as asked"));
    }
    println!("done");
    Ok(())
}
