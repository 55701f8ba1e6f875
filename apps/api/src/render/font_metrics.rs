//! Width tables for the two standard PDF fonts the form uses.
//!
//! Widths come from the Adobe Core14 AFM files, in 1/1000 em. Both tables
//! cover ASCII 0x20..=0x7E (95 printable characters); index = (char as usize) - 32.
//! Latin-1 characters above 0x7E fall back to `average_width`. Anything outside
//! Latin-1 is drawn as `?` and measured as such.

// ────────────────────────────────────────────────────────────────────────────
// Font enum
// ────────────────────────────────────────────────────────────────────────────

/// Standard Type1 fonts available to every PDF reader without embedding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
}

impl StandardFont {
    pub const ALL: [StandardFont; 2] = [StandardFont::Helvetica, StandardFont::HelveticaBold];

    pub fn base_font(self) -> &'static str {
        match self {
            StandardFont::Helvetica => "Helvetica",
            StandardFont::HelveticaBold => "Helvetica-Bold",
        }
    }

    /// Key under `/Resources /Font`.
    pub fn resource_name(self) -> &'static str {
        match self {
            StandardFont::Helvetica => "F1",
            StandardFont::HelveticaBold => "F2",
        }
    }

    pub fn metrics(self) -> &'static FontMetricTable {
        match self {
            StandardFont::Helvetica => &HELVETICA_TABLE,
            StandardFont::HelveticaBold => &HELVETICA_BOLD_TABLE,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Font metric table
// ────────────────────────────────────────────────────────────────────────────

/// Helvetica FontBBox height (931 - -225) in 1/1000 em; a text line advances by this.
pub const LINE_HEIGHT_EM: f32 = 1.156;
/// Helvetica ascender in 1/1000 em; baseline sits this far below the line top.
pub const ASCENDER_EM: f32 = 0.718;

pub struct FontMetricTable {
    widths: [u16; 95],
    pub average_width: u16,
}

impl FontMetricTable {
    fn char_width(&self, c: char) -> u16 {
        match encode_char(c) {
            code @ 0x20..=0x7E => self.widths[usize::from(code) - 32],
            _ => self.average_width,
        }
    }

    /// Rendered width of `s` in points at `size`.
    pub fn measure(&self, s: &str, size: f32) -> f32 {
        let units: u32 = s.chars().map(|c| u32::from(self.char_width(c))).sum();
        units as f32 * size / 1000.0
    }

    /// Greedy word-wrap of `text` to `max_width` points.
    ///
    /// Explicit newlines always break. A paragraph that fits is returned verbatim
    /// (spacing preserved); wrapped paragraphs are re-joined with single spaces.
    /// A single word wider than the line is placed on its own line unbroken.
    pub fn wrap(&self, text: &str, size: f32, max_width: f32) -> Vec<String> {
        let mut lines = Vec::new();
        for paragraph in text.split('\n') {
            let paragraph = paragraph.trim_end_matches('\r');
            if self.measure(paragraph, size) <= max_width {
                lines.push(paragraph.to_string());
                continue;
            }

            let space = self.measure(" ", size);
            let mut current = String::new();
            let mut current_width = 0.0_f32;
            for word in paragraph.split_whitespace() {
                let word_width = self.measure(word, size);
                if !current.is_empty() && current_width + space + word_width > max_width {
                    lines.push(std::mem::take(&mut current));
                    current_width = 0.0;
                }
                if !current.is_empty() {
                    current.push(' ');
                    current_width += space;
                }
                current.push_str(word);
                current_width += word_width;
            }
            lines.push(current);
        }
        lines
    }
}

/// Maps a char to its WinAnsiEncoding byte. Only the Latin-1 compatible range is
/// used; everything else becomes `?`.
pub fn encode_char(c: char) -> u8 {
    match u32::from(c) {
        code @ (0x20..=0x7E | 0xA0..=0xFF) => code as u8,
        _ => b'?',
    }
}

pub fn encode_text(s: &str) -> Vec<u8> {
    s.chars().map(encode_char).collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Static width tables
// ────────────────────────────────────────────────────────────────────────────

static HELVETICA_TABLE: FontMetricTable = FontMetricTable {
    #[rustfmt::skip]
    widths: [
        // sp   !    "    #    $    %    &    '    (    )    *    +    ,    -    .    /
        278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
        // 0    1    2    3    4    5    6    7    8    9
        556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
        // :    ;    <    =    >    ?    @
        278, 278, 584, 584, 584, 556, 1015,
        // A    B    C    D    E    F    G    H    I    J    K    L    M
        667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,
        // N    O    P    Q    R    S    T    U    V    W    X    Y    Z
        722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
        // [    \    ]    ^    _    `
        278, 278, 278, 469, 556, 333,
        // a    b    c    d    e    f    g    h    i    j    k    l    m
        556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,
        // n    o    p    q    r    s    t    u    v    w    x    y    z
        556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,
        // {    |    }    ~
        334, 260, 334, 584,
    ],
    average_width: 556,
};

static HELVETICA_BOLD_TABLE: FontMetricTable = FontMetricTable {
    #[rustfmt::skip]
    widths: [
        // sp   !    "    #    $    %    &    '    (    )    *    +    ,    -    .    /
        278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
        // 0    1    2    3    4    5    6    7    8    9
        556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
        // :    ;    <    =    >    ?    @
        333, 333, 584, 584, 584, 611, 975,
        // A    B    C    D    E    F    G    H    I    J    K    L    M
        722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
        // N    O    P    Q    R    S    T    U    V    W    X    Y    Z
        722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
        // [    \    ]    ^    _    `
        333, 278, 333, 584, 556, 333,
        // a    b    c    d    e    f    g    h    i    j    k    l    m
        556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
        // n    o    p    q    r    s    t    u    v    w    x    y    z
        611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
        // {    |    }    ~
        389, 280, 389, 584,
    ],
    average_width: 611,
};

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
