//! Named colors and color-string parsing

use crate::error::ColorError;
use crate::util::opaque;

/// Color dictionary: the W3C/X11 names plus tint aliases and a few element
/// colors used for ball-and-stick defaults.
pub const NAMED_COLORS: &[(&str, u32)] = &[
    ("aliceblue", 0xFFF0_F8FF),
    ("antiquewhite", 0xFFFA_EBD7),
    ("aqua", 0xFF00_FFFF),
    ("aquamarine", 0xFF7F_FFD4),
    ("azure", 0xFFF0_FFFF),
    ("beige", 0xFFF5_F5DC),
    ("bisque", 0xFFFF_E4C4),
    ("black", 0xFF00_0000),
    ("blanchedalmond", 0xFFFF_EBCD),
    ("blue", 0xFF00_00FF),
    ("blueviolet", 0xFF8A_2BE2),
    ("brown", 0xFFA5_2A2A),
    ("burlywood", 0xFFDE_B887),
    ("cadetblue", 0xFF5F_9EA0),
    ("chartreuse", 0xFF7F_FF00),
    ("chocolate", 0xFFD2_691E),
    ("coral", 0xFFFF_7F50),
    ("cornflowerblue", 0xFF64_95ED),
    ("cornsilk", 0xFFFF_F8DC),
    ("crimson", 0xFFDC_143C),
    ("cyan", 0xFF00_FFFF),
    ("darkblue", 0xFF00_008B),
    ("darkcyan", 0xFF00_8B8B),
    ("darkgoldenrod", 0xFFB8_860B),
    ("darkgray", 0xFFA9_A9A9),
    ("darkgreen", 0xFF00_6400),
    ("darkgrey", 0xFFA9_A9A9),
    ("darkkhaki", 0xFFBD_B76B),
    ("darkmagenta", 0xFF8B_008B),
    ("darkolivegreen", 0xFF55_6B2F),
    ("darkorange", 0xFFFF_8C00),
    ("darkorchid", 0xFF99_32CC),
    ("darkred", 0xFF8B_0000),
    ("darksalmon", 0xFFE9_967A),
    ("darkseagreen", 0xFF8F_BC8F),
    ("darkslateblue", 0xFF48_3D8B),
    ("darkslategray", 0xFF2F_4F4F),
    ("darkslategrey", 0xFF2F_4F4F),
    ("darkturquoise", 0xFF00_CED1),
    ("darkviolet", 0xFF94_00D3),
    ("deeppink", 0xFFFF_1493),
    ("deepskyblue", 0xFF00_BFFF),
    ("dimgray", 0xFF69_6969),
    ("dimgrey", 0xFF69_6969),
    ("dodgerblue", 0xFF1E_90FF),
    ("firebrick", 0xFFB2_2222),
    ("floralwhite", 0xFFFF_FAF0),
    ("forestgreen", 0xFF22_8B22),
    ("fuchsia", 0xFFFF_00FF),
    ("gainsboro", 0xFFDC_DCDC),
    ("ghostwhite", 0xFFF8_F8FF),
    ("gold", 0xFFFF_D700),
    ("goldenrod", 0xFFDA_A520),
    ("gray", 0xFF80_8080),
    ("green", 0xFF00_8000),
    ("greenyellow", 0xFFAD_FF2F),
    ("grey", 0xFF80_8080),
    ("honeydew", 0xFFF0_FFF0),
    ("hotpink", 0xFFFF_69B4),
    ("indianred", 0xFFCD_5C5C),
    ("indigo", 0xFF4B_0082),
    ("ivory", 0xFFFF_FFF0),
    ("khaki", 0xFFF0_E68C),
    ("lavender", 0xFFE6_E6FA),
    ("lavenderblush", 0xFFFF_F0F5),
    ("lawngreen", 0xFF7C_FC00),
    ("lemonchiffon", 0xFFFF_FACD),
    ("lightblue", 0xFFAD_D8E6),
    ("lightcoral", 0xFFF0_8080),
    ("lightcyan", 0xFFE0_FFFF),
    ("lightgoldenrodyellow", 0xFFFA_FAD2),
    ("lightgray", 0xFFD3_D3D3),
    ("lightgreen", 0xFF90_EE90),
    ("lightgrey", 0xFFD3_D3D3),
    ("lightpink", 0xFFFF_B6C1),
    ("lightsalmon", 0xFFFF_A07A),
    ("lightseagreen", 0xFF20_B2AA),
    ("lightskyblue", 0xFF87_CEFA),
    ("lightslategray", 0xFF77_8899),
    ("lightslategrey", 0xFF77_8899),
    ("lightsteelblue", 0xFFB0_C4DE),
    ("lightyellow", 0xFFFF_FFE0),
    ("lime", 0xFF00_FF00),
    ("limegreen", 0xFF32_CD32),
    ("linen", 0xFFFA_F0E6),
    ("magenta", 0xFFFF_00FF),
    ("maroon", 0xFF80_0000),
    ("mediumaquamarine", 0xFF66_CDAA),
    ("mediumblue", 0xFF00_00CD),
    ("mediumorchid", 0xFFBA_55D3),
    ("mediumpurple", 0xFF93_70DB),
    ("mediumseagreen", 0xFF3C_B371),
    ("mediumslateblue", 0xFF7B_68EE),
    ("mediumspringgreen", 0xFF00_FA9A),
    ("mediumturquoise", 0xFF48_D1CC),
    ("mediumvioletred", 0xFFC7_1585),
    ("midnightblue", 0xFF19_1970),
    ("mintcream", 0xFFF5_FFFA),
    ("mistyrose", 0xFFFF_E4E1),
    ("moccasin", 0xFFFF_E4B5),
    ("navajowhite", 0xFFFF_DEAD),
    ("navy", 0xFF00_0080),
    ("oldlace", 0xFFFD_F5E6),
    ("olive", 0xFF80_8000),
    ("olivedrab", 0xFF6B_8E23),
    ("orange", 0xFFFF_A500),
    ("orangered", 0xFFFF_4500),
    ("orchid", 0xFFDA_70D6),
    ("palegoldenrod", 0xFFEE_E8AA),
    ("palegreen", 0xFF98_FB98),
    ("paleturquoise", 0xFFAF_EEEE),
    ("palevioletred", 0xFFDB_7093),
    ("papayawhip", 0xFFFF_EFD5),
    ("peachpuff", 0xFFFF_DAB9),
    ("peru", 0xFFCD_853F),
    ("pink", 0xFFFF_C0CB),
    ("plum", 0xFFDD_A0DD),
    ("powderblue", 0xFFB0_E0E6),
    ("purple", 0xFF80_0080),
    ("red", 0xFFFF_0000),
    ("rosybrown", 0xFFBC_8F8F),
    ("royalblue", 0xFF41_69E1),
    ("saddlebrown", 0xFF8B_4513),
    ("salmon", 0xFFFA_8072),
    ("sandybrown", 0xFFF4_A460),
    ("seagreen", 0xFF2E_8B57),
    ("seashell", 0xFFFF_F5EE),
    ("sienna", 0xFFA0_522D),
    ("silver", 0xFFC0_C0C0),
    ("skyblue", 0xFF87_CEEB),
    ("slateblue", 0xFF6A_5ACD),
    ("slategray", 0xFF70_8090),
    ("slategrey", 0xFF70_8090),
    ("snow", 0xFFFF_FAFA),
    ("springgreen", 0xFF00_FF7F),
    ("steelblue", 0xFF46_82B4),
    ("tan", 0xFFD2_B48C),
    ("teal", 0xFF00_8080),
    ("thistle", 0xFFD8_BFD8),
    ("tomato", 0xFFFF_6347),
    ("turquoise", 0xFF40_E0D0),
    ("violet", 0xFFEE_82EE),
    ("wheat", 0xFFF5_DEB3),
    ("white", 0xFFFF_FFFF),
    ("whitesmoke", 0xFFF5_F5F5),
    ("yellow", 0xFFFF_FF00),
    ("yellowgreen", 0xFF9A_CD32),
    ("bluetint", 0xFFAF_D7FF),
    ("greenblue", 0xFF2E_8B57),
    ("greentint", 0xFFC7_FFC7),
    ("pinktint", 0xFFFF_ABBB),
    ("redorange", 0xFFFF_4500),
    ("yellowtint", 0xFFF6_F675),
    ("carbon", 0xFFC8_C8C8),
    ("nitrogen", 0xFF8F_8FFF),
    ("oxygen", 0xFFF0_0000),
    ("sulfur", 0xFFFF_C832),
    ("hydrogen", 0xFFFF_FFFF),
];

/// Look up a color name, ignoring ASCII case and surrounding whitespace
pub fn lookup_named(name: &str) -> Option<u32> {
    let name = name.trim();
    NAMED_COLORS
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|&(_, argb)| argb)
}

/// Parse `#RRGGBB`, `[xRRGGBB]` or a color name into an opaque ARGB value
pub fn parse_color(s: &str) -> Result<u32, ColorError> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix('#') {
        return parse_hex(hex).ok_or_else(|| ColorError::MalformedHex(s.to_string()));
    }
    if let Some(hex) = s
        .strip_prefix("[x")
        .or_else(|| s.strip_prefix("[X"))
        .and_then(|rest| rest.strip_suffix(']'))
    {
        return parse_hex(hex).ok_or_else(|| ColorError::MalformedHex(s.to_string()));
    }
    lookup_named(s).ok_or_else(|| ColorError::UnknownName(s.to_string()))
}

fn parse_hex(hex: &str) -> Option<u32> {
    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(hex, 16).ok().map(opaque)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_colors() {
        assert_eq!(parse_color("#FF8000"), Ok(0xFFFF_8000));
        assert_eq!(parse_color("#00ff7f"), Ok(0xFF00_FF7F));
        assert_eq!(parse_color("[x102030]"), Ok(0xFF10_2030));
        assert!(matches!(parse_color("#12345"), Err(ColorError::MalformedHex(_))));
        assert!(matches!(parse_color("#GG0000"), Err(ColorError::MalformedHex(_))));
    }

    #[test]
    fn test_named_colors() {
        assert_eq!(parse_color("red"), Ok(0xFFFF_0000));
        assert_eq!(parse_color("  CornflowerBlue "), Ok(0xFF64_95ED));
        assert_eq!(lookup_named("grey"), lookup_named("gray"));
        assert_eq!(
            parse_color("unobtainium"),
            Err(ColorError::UnknownName("unobtainium".to_string()))
        );
    }

    #[test]
    fn test_dictionary_is_well_formed() {
        assert!(NAMED_COLORS.len() >= 140);
        for (i, (name, argb)) in NAMED_COLORS.iter().enumerate() {
            assert_eq!(argb >> 24, 0xFF, "{} not opaque", name);
            assert_eq!(*name, name.to_ascii_lowercase());
            assert!(
                NAMED_COLORS[..i].iter().all(|(n, _)| n != name),
                "duplicate {}",
                name
            );
        }
    }
}
