/// Text terminal: cursor, scrolling and line discipline over one 80x25 page of text cells. The
/// page may be the live VGA buffer or an off-screen copy, the terminal never knows which.
use volatile::Volatile;

use super::defs::*;

pub struct Terminal {
    row: usize,
    column: usize,
    line: [u8; LINE_BUFFER_SIZE],
    line_length: usize,
    line_ready: bool,
}

fn cell(byte: u8) -> u16 {
    (TEXT_ATTRIBUTE << 8) | byte as u16
}

impl Terminal {
    pub const fn new() -> Self {
        Terminal {
            row: 0,
            column: 0,
            line: [0; LINE_BUFFER_SIZE],
            line_length: 0,
            line_ready: false,
        }
    }

    pub fn cursor(&self) -> (usize, usize) {
        (self.row, self.column)
    }

    pub fn clear(&mut self, screen: &mut [Volatile<u16>]) {
        for position in screen.iter_mut().take(SCREEN_CELLS) {
            position.write(BLANK_CELL);
        }
        self.row = 0;
        self.column = 0;
    }

    fn scroll(&mut self, screen: &mut [Volatile<u16>]) {
        for index in SCREEN_WIDTH..SCREEN_CELLS {
            let value = screen[index].read();
            screen[index - SCREEN_WIDTH].write(value);
        }
        for index in SCREEN_CELLS - SCREEN_WIDTH..SCREEN_CELLS {
            screen[index].write(BLANK_CELL);
        }
        self.row = SCREEN_HEIGHT - 1;
    }

    fn new_line(&mut self, screen: &mut [Volatile<u16>]) {
        self.column = 0;
        self.row += 1;
        if self.row == SCREEN_HEIGHT {
            self.scroll(screen);
        }
    }

    pub fn put_byte(&mut self, screen: &mut [Volatile<u16>], byte: u8) {
        match byte {
            b'\n' => self.new_line(screen),
            BACKSPACE => {
                if self.column > 0 {
                    self.column -= 1;
                } else if self.row > 0 {
                    self.row -= 1;
                    self.column = SCREEN_WIDTH - 1;
                }
                screen[self.row * SCREEN_WIDTH + self.column].write(BLANK_CELL);
            }
            byte => {
                screen[self.row * SCREEN_WIDTH + self.column].write(cell(byte));
                self.column += 1;
                if self.column == SCREEN_WIDTH {
                    self.new_line(screen);
                }
            }
        }
    }

    pub fn write(&mut self, screen: &mut [Volatile<u16>], buffer: &[u8]) -> usize {
        for &byte in buffer {
            self.put_byte(screen, byte);
        }
        buffer.len()
    }

    /// Keyboard input with echo. Enter completes the line, which stays pending until a reader
    /// takes it; keys typed meanwhile are dropped.
    pub fn push_input(&mut self, screen: &mut [Volatile<u16>], byte: u8) {
        if self.line_ready {
            return;
        }

        match byte {
            b'\n' | b'\r' => {
                self.line[self.line_length] = b'\n';
                self.line_length += 1;
                self.line_ready = true;
                self.put_byte(screen, b'\n');
            }
            BACKSPACE | DELETE => {
                if self.line_length > 0 {
                    self.line_length -= 1;
                    self.put_byte(screen, BACKSPACE);
                }
            }
            byte => {
                // Last slot is kept for the newline
                if self.line_length < LINE_BUFFER_SIZE - 1 {
                    self.line[self.line_length] = byte;
                    self.line_length += 1;
                    self.put_byte(screen, byte);
                }
            }
        }
    }

    /// Hands out the pending line, newline included, truncated to `buffer`
    pub fn take_line(&mut self, buffer: &mut [u8]) -> Option<usize> {
        if !self.line_ready {
            return None;
        }

        let length = self.line_length.min(buffer.len());
        buffer[..length].copy_from_slice(&self.line[..length]);
        self.line_length = 0;
        self.line_ready = false;
        Some(length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank_screen() -> Vec<Volatile<u16>> {
        vec![Volatile::new(BLANK_CELL); SCREEN_CELLS]
    }

    fn row_text(screen: &[Volatile<u16>], row: usize) -> String {
        screen[row * SCREEN_WIDTH..(row + 1) * SCREEN_WIDTH]
            .iter()
            .map(|cell| (cell.read() & 0xFF) as u8 as char)
            .collect::<String>()
            .trim_end()
            .to_string()
    }

    #[test]
    fn writes_and_wraps_lines() {
        let mut screen = blank_screen();
        let mut terminal = Terminal::new();

        terminal.write(&mut screen, b"hello\nworld");
        assert_eq!(row_text(&screen, 0), "hello");
        assert_eq!(row_text(&screen, 1), "world");
        assert_eq!(terminal.cursor(), (1, 5));

        terminal.write(&mut screen, &[b'x'; SCREEN_WIDTH]);
        assert_eq!(terminal.cursor(), (2, 5));
    }

    #[test]
    fn scrolls_at_bottom() {
        let mut screen = blank_screen();
        let mut terminal = Terminal::new();

        for row in 0..SCREEN_HEIGHT {
            terminal.write(&mut screen, format!("line {}\n", row).as_bytes());
        }

        assert_eq!(row_text(&screen, 0), "line 1");
        assert_eq!(row_text(&screen, SCREEN_HEIGHT - 1), "");
        assert_eq!(terminal.cursor(), (SCREEN_HEIGHT - 1, 0));
    }

    #[test]
    fn line_discipline_handles_backspace() {
        let mut screen = blank_screen();
        let mut terminal = Terminal::new();
        let mut buffer = [0u8; LINE_BUFFER_SIZE];

        for &byte in b"lsx" {
            terminal.push_input(&mut screen, byte);
        }
        assert_eq!(terminal.take_line(&mut buffer), None);

        terminal.push_input(&mut screen, BACKSPACE);
        terminal.push_input(&mut screen, b'\n');
        assert_eq!(row_text(&screen, 0), "ls");

        let length = terminal.take_line(&mut buffer).unwrap();
        assert_eq!(&buffer[..length], b"ls\n");
        assert_eq!(terminal.take_line(&mut buffer), None);
    }

    #[test]
    fn long_lines_keep_room_for_newline() {
        let mut screen = blank_screen();
        let mut terminal = Terminal::new();
        let mut buffer = [0u8; 2 * LINE_BUFFER_SIZE];

        for _ in 0..200 {
            terminal.push_input(&mut screen, b'a');
        }
        terminal.push_input(&mut screen, b'\n');

        let length = terminal.take_line(&mut buffer).unwrap();
        assert_eq!(length, LINE_BUFFER_SIZE);
        assert_eq!(buffer[length - 1], b'\n');
    }
}
