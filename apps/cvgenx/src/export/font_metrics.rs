//! Static font-metric tables for the PDF standard fonts used by the exporter.
//!
//! Widths are the Adobe AFM advance widths in 1/1000 em. The tables cover
//! ASCII 0x20..=0x7E (95 printable characters), index = byte - 32. Bytes above
//! 0x7E are WinAnsi-encoded and resolved by `high_byte_width`.

/// The five font resources embedded in every exported PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Font {
    Regular,
    Bold,
    Oblique,
    BoldOblique,
    Mono,
}

impl Font {
    pub const ALL: [Font; 5] = [
        Font::Regular,
        Font::Bold,
        Font::Oblique,
        Font::BoldOblique,
        Font::Mono,
    ];

    pub fn for_style(bold: bool, italic: bool, code: bool) -> Font {
        match (code, bold, italic) {
            (true, _, _) => Font::Mono,
            (false, true, true) => Font::BoldOblique,
            (false, true, false) => Font::Bold,
            (false, false, true) => Font::Oblique,
            (false, false, false) => Font::Regular,
        }
    }

    /// Name of the font in the page resource dictionary.
    pub fn resource_name(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
            Font::Oblique => "F3",
            Font::BoldOblique => "F4",
            Font::Mono => "F5",
        }
    }

    pub fn base_font(self) -> &'static str {
        match self {
            Font::Regular => "Helvetica",
            Font::Bold => "Helvetica-Bold",
            Font::Oblique => "Helvetica-Oblique",
            Font::BoldOblique => "Helvetica-BoldOblique",
            Font::Mono => "Courier",
        }
    }

    pub fn metrics(self) -> &'static FontMetricTable {
        match self {
            // Obliques are slanted copies and share advance widths.
            Font::Regular | Font::Oblique => &HELVETICA_TABLE,
            Font::Bold | Font::BoldOblique => &HELVETICA_BOLD_TABLE,
            Font::Mono => &COURIER_TABLE,
        }
    }
}

/// Static character-width table for one font.
///
/// Width array slot layout:
/// ```text
/// [0]=sp  [1]=!   [2]="   [3]=#   [4]=$   [5]=%   [6]=&   [7]='
/// [8]=(   [9]=)   [10]=*  [11]=+  [12]=,  [13]=-  [14]=.  [15]=/
/// [16..25]=0-9
/// [26]=:  [27]=;  [28]=<  [29]==  [30]=>  [31]=?  [32]=@
/// [33..58]=A-Z
/// [59]=[  [60]=\  [61]=]  [62]=^  [63]=_  [64]=`
/// [65..90]=a-z
/// [91]={  [92]=|  [93]=}  [94]=~
/// ```
pub struct FontMetricTable {
    widths: [u16; 95],
    /// Width used for WinAnsi bytes without a specific entry.
    fallback: u16,
    monospaced: bool,
}

impl FontMetricTable {
    /// Advance width of one WinAnsi byte, in 1/1000 em.
    pub fn byte_width(&self, byte: u8) -> u16 {
        if self.monospaced {
            return self.fallback;
        }
        match byte {
            0x20..=0x7E => self.widths[(byte - 0x20) as usize],
            _ => high_byte_width(byte).unwrap_or(self.fallback),
        }
    }

    /// Rendered width in points of WinAnsi-encoded text at `size`.
    pub fn measure(&self, encoded: &[u8], size: f32) -> f32 {
        let units: u32 = encoded.iter().map(|b| self.byte_width(*b) as u32).sum();
        units as f32 * size / 1000.0
    }
}

/// Widths for the WinAnsi punctuation a generated resume actually contains.
fn high_byte_width(byte: u8) -> Option<u16> {
    match byte {
        0x85 | 0x97 => Some(1000), // ellipsis, em dash
        0x95 => Some(350),          // bullet
        0x96 => Some(556),          // en dash
        0x91 | 0x92 => Some(222),   // single quotes
        0x93 | 0x94 => Some(333),   // double quotes
        0xA0 => Some(278),          // no-break space
        _ => None,
    }
}

/// Encodes text for a Type1 font with `WinAnsiEncoding`.
///
/// Latin-1 maps directly; typographic punctuation goes to its cp1252 slot;
/// anything else becomes `?`. Control characters are dropped.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '\u{20AC}' => 0x80,
            '\u{2026}' => 0x85,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\u{2122}' => 0x99,
            c if (c as u32) < 0x80 => c as u8,
            c if (0xA0..=0xFF).contains(&(c as u32)) => c as u8,
            _ => b'?',
        })
        .collect()
}

/// Helvetica, from the Adobe core-14 AFM.
static HELVETICA_TABLE: FontMetricTable = FontMetricTable {
    #[rustfmt::skip]
    widths: [
        // sp    !     "     #     $     %     &     '     (     )     *     +     ,     -     .     /
        278,  278,  355,  556,  556,  889,  667,  191,  333,  333,  389,  584,  278,  333,  278,  278,
        // 0     1     2     3     4     5     6     7     8     9
        556,  556,  556,  556,  556,  556,  556,  556,  556,  556,
        // :     ;     <     =     >     ?     @
        278,  278,  584,  584,  584,  556, 1015,
        // A     B     C     D     E     F     G     H     I     J     K     L     M
        667,  667,  722,  722,  667,  611,  778,  722,  278,  500,  667,  556,  833,
        // N     O     P     Q     R     S     T     U     V     W     X     Y     Z
        722,  778,  667,  778,  722,  667,  611,  722,  667,  944,  667,  667,  611,
        // [     \     ]     ^     _     `
        278,  278,  278,  469,  556,  333,
        // a     b     c     d     e     f     g     h     i     j     k     l     m
        556,  556,  500,  556,  556,  278,  556,  556,  222,  222,  500,  222,  833,
        // n     o     p     q     r     s     t     u     v     w     x     y     z
        556,  556,  556,  556,  333,  500,  278,  556,  500,  722,  500,  500,  500,
        // {     |     }     ~
        334,  260,  334,  584,
    ],
    fallback: 556,
    monospaced: false,
};

/// Helvetica-Bold, from the Adobe core-14 AFM.
static HELVETICA_BOLD_TABLE: FontMetricTable = FontMetricTable {
    #[rustfmt::skip]
    widths: [
        // sp    !     "     #     $     %     &     '     (     )     *     +     ,     -     .     /
        278,  333,  474,  556,  556,  889,  722,  238,  333,  333,  389,  584,  278,  333,  278,  278,
        // 0     1     2     3     4     5     6     7     8     9
        556,  556,  556,  556,  556,  556,  556,  556,  556,  556,
        // :     ;     <     =     >     ?     @
        333,  333,  584,  584,  584,  611,  975,
        // A     B     C     D     E     F     G     H     I     J     K     L     M
        722,  722,  722,  722,  667,  611,  778,  722,  278,  556,  722,  611,  833,
        // N     O     P     Q     R     S     T     U     V     W     X     Y     Z
        722,  778,  667,  778,  722,  667,  611,  722,  667,  944,  667,  667,  611,
        // [     \     ]     ^     _     `
        333,  278,  333,  584,  556,  333,
        // a     b     c     d     e     f     g     h     i     j     k     l     m
        556,  611,  556,  611,  556,  333,  611,  611,  278,  278,  556,  278,  889,
        // n     o     p     q     r     s     t     u     v     w     x     y     z
        611,  611,  611,  611,  389,  556,  333,  611,  556,  778,  556,  556,  500,
        // {     |     }     ~
        389,  280,  389,  584,
    ],
    fallback: 556,
    monospaced: false,
};

static COURIER_TABLE: FontMetricTable = FontMetricTable {
    widths: [600; 95],
    fallback: 600,
    monospaced: true,
};
