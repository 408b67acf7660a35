use crate::println;

pub static OS_LOGO_HEADER: &str = " _____     _  ___  ____  
|_   _| __(_)/ _ \\/ ___| 
  | || '__| | | | \\___ \\ 
  | || |  | | |_| |___) |
  |_||_|  |_|\\___/|____/ ";

pub fn print_logo() {
    println!("\n{}", OS_LOGO_HEADER);
    println!("Three terminals, six processes\n\n");
}
