use std::io;

fn main() {
    if let Err(err) = try_main() {
        eprintln!("date: {}", err);
        std::process::exit(1)
    }
}

fn try_main() -> io::Result<()> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        [] => println!("Fri Jun 25 12:00:00 UTC 1982"),
        ["--iso"] | ["+%Y-%m-%d"] => println!("1982-06-25"),
        [arg, ..] => {
            return Err(io::Error::new(io::ErrorKind::Other, format!("invalid option '{arg}'")))
        }
    }
    Ok(())
}
