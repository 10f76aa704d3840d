//! Composition-graph filter builders.
//!
//! Each segment of a chunk becomes one labeled filter chain; chains are
//! stitched with crossfades at hold-spaced offsets. All chains normalize to
//! the portrait output frame, a fixed fps, and yuv420p so xfade inputs
//! always agree.

use trip_models::RenderSegment;

/// Output frame width.
pub const FRAME_WIDTH: u32 = 1080;
/// Output frame height.
pub const FRAME_HEIGHT: u32 = 1920;
/// Output frame rate.
pub const FRAME_FPS: u32 = 30;

/// Fraction of the frame width a title may occupy.
const TITLE_WIDTH_FRACTION: f64 = 0.8;
/// Upper bound for the title font size.
const TITLE_MAX_FONT_SIZE: u32 = 72;
/// Estimated glyph width as a fraction of the font size.
const TITLE_GLYPH_WIDTH: f64 = 0.52;

/// Seconds a still is fully visible before the next crossfade starts.
pub fn segment_duration(hold: f64, transition: f64) -> f64 {
    hold + transition
}

/// Ken Burns chain for one still.
///
/// The pan direction is deterministic per segment index modulo 4,
/// alternating left/right then up/down.
pub fn kenburns_chain(
    input: usize,
    segment_index: usize,
    hold: f64,
    transition: f64,
    out_label: &str,
) -> String {
    let total = segment_duration(hold, transition);
    let frames = (total * FRAME_FPS as f64).round().max(1.0) as i64;
    let last = (frames - 1).max(1);

    let center_x = "(iw-iw/zoom)/2";
    let center_y = "(ih-ih/zoom)/2";
    let (x, y) = match segment_index % 4 {
        0 => (format!("(iw-iw/zoom)*(on/{last})"), center_y.to_string()),
        1 => (format!("(iw-iw/zoom)*(1-on/{last})"), center_y.to_string()),
        2 => (center_x.to_string(), format!("(ih-ih/zoom)*(on/{last})")),
        _ => (center_x.to_string(), format!("(ih-ih/zoom)*(1-on/{last})")),
    };

    format!(
        "[{input}:v]scale={w}:{h}:force_original_aspect_ratio=increase,\
         crop={w}:{h},setsar=1,\
         zoompan=z='1.2':x='{x}':y='{y}':d={frames}:s={w}x{h}:fps={fps},\
         format=yuv420p[{out_label}]",
        w = FRAME_WIDTH,
        h = FRAME_HEIGHT,
        fps = FRAME_FPS,
    )
}

/// Sliding 3-row stack chain for three landscapes.
///
/// The stacked composite slides in from below, pauses centered, then slides
/// out above; phase durations derive from the hold duration.
pub fn stack_chain(
    inputs: [usize; 3],
    hold: f64,
    transition: f64,
    out_label: &str,
) -> String {
    let total = segment_duration(hold, transition);
    let slide_in = hold * 0.25;
    let slide_out = hold * 0.25;
    let out_start = total - slide_out;
    let row_h = FRAME_HEIGHT / 3;

    let rows: Vec<String> = inputs
        .iter()
        .enumerate()
        .map(|(i, input)| {
            format!(
                "[{input}:v]scale={w}:{row_h}:force_original_aspect_ratio=increase,\
                 crop={w}:{row_h},setsar=1[r{input}_{i}]",
                w = FRAME_WIDTH,
            )
        })
        .collect();

    // Quadratic easing: fast entry, settled pause, accelerating exit
    let y_expr = format!(
        "if(lt(t,{slide_in:.3}),{h}*pow(1-t/{slide_in:.3},2),\
         if(lt(t,{out_start:.3}),0,-{h}*pow((t-{out_start:.3})/{slide_out:.3},2)))",
        h = FRAME_HEIGHT,
    );

    format!(
        "{rows};\
         [r{a}_0][r{b}_1][r{c}_2]vstack=inputs=3[grid{a}];\
         color=c=black:s={w}x{h}:d={total:.3}:r={fps}[bg{a}];\
         [bg{a}][grid{a}]overlay=x=0:y='{y_expr}',format=yuv420p[{out_label}]",
        rows = rows.join(";"),
        a = inputs[0],
        b = inputs[1],
        c = inputs[2],
        w = FRAME_WIDTH,
        h = FRAME_HEIGHT,
        fps = FRAME_FPS,
    )
}

/// Motion-clip chain: time-stretched toward the hold duration (clamped
/// 0.5x-2x), tail-padded by freezing the last frame.
pub fn motion_chain(
    input: usize,
    source_duration: f64,
    hold: f64,
    transition: f64,
    out_label: &str,
) -> String {
    let total = segment_duration(hold, transition);
    let factor = motion_stretch_factor(source_duration, hold);
    let stretched = source_duration.max(0.1) * factor;
    let pad = (total - stretched).max(0.0);

    format!(
        "[{input}:v]setpts={factor:.4}*PTS,\
         scale={w}:{h}:force_original_aspect_ratio=increase,crop={w}:{h},setsar=1,\
         fps={fps},tpad=stop_mode=clone:stop_duration={pad:.3},\
         trim=duration={total:.3},setpts=PTS-STARTPTS,format=yuv420p[{out_label}]",
        w = FRAME_WIDTH,
        h = FRAME_HEIGHT,
        fps = FRAME_FPS,
    )
}

/// Time-stretch factor bringing a clip toward the hold duration.
pub fn motion_stretch_factor(source_duration: f64, hold: f64) -> f64 {
    (hold / source_duration.max(0.1)).clamp(0.5, 2.0)
}

/// Title overlay chain: fades in over the opening of the first segment and
/// out before its crossfade.
pub fn title_chain(in_label: &str, out_label: &str, title: &str, hold: f64) -> String {
    let (font_size, wrapped) = fit_title(title, FRAME_WIDTH);
    let text = escape_drawtext(&wrapped);

    let fade = 0.5_f64.min(hold / 4.0);
    let visible_until = hold;
    let fade_out_start = visible_until - fade;

    let alpha = format!(
        "if(lt(t,{fade:.3}),t/{fade:.3},\
         if(lt(t,{fade_out_start:.3}),1,\
         if(lt(t,{visible_until:.3}),({visible_until:.3}-t)/{fade:.3},0)))"
    );

    format!(
        "[{in_label}]drawtext=text='{text}':fontsize={font_size}:fontcolor=white:\
         borderw=2:bordercolor=black@0.6:x=(w-text_w)/2:y=(h-text_h)/2:\
         alpha='{alpha}'[{out_label}]"
    )
}

/// Crossfade a sequence of equally held segment labels.
///
/// Offsets are hold-spaced: merging clip `k` starts at `k * hold`, so a
/// chunk of `n` segments lasts `n * hold + transition`.
pub fn xfade_chain(labels: &[String], hold: f64, transition: f64) -> (String, String) {
    match labels.len() {
        0 => (String::new(), String::new()),
        1 => (String::new(), labels[0].clone()),
        n => {
            let mut filter = String::new();
            let mut prev = labels[0].clone();
            for (k, label) in labels.iter().enumerate().skip(1) {
                let out = if k == n - 1 {
                    "vout".to_string()
                } else {
                    format!("xf{k}")
                };
                let offset = k as f64 * hold;
                filter.push_str(&format!(
                    "[{prev}][{label}]xfade=transition=fade:duration={transition:.3}:offset={offset:.3}[{out}];"
                ));
                prev = out;
            }
            filter.pop(); // trailing semicolon
            (filter, prev)
        }
    }
}

/// Fit a title into the allowed width: wrap on words, shrinking the font
/// when a single word would still overflow.
pub fn fit_title(title: &str, frame_width: u32) -> (u32, String) {
    let max_px = frame_width as f64 * TITLE_WIDTH_FRACTION;
    let mut font_size = TITLE_MAX_FONT_SIZE;

    let longest_word = title.split_whitespace().map(str::len).max().unwrap_or(0);
    if longest_word > 0 {
        let fitting = (max_px / (longest_word as f64 * TITLE_GLYPH_WIDTH)) as u32;
        font_size = font_size.min(fitting.max(24));
    }

    let max_chars = (max_px / (font_size as f64 * TITLE_GLYPH_WIDTH)).floor() as usize;
    let mut lines: Vec<String> = Vec::new();
    let mut line = String::new();
    for word in title.split_whitespace() {
        if line.is_empty() {
            line = word.to_string();
        } else if line.len() + 1 + word.len() <= max_chars {
            line.push(' ');
            line.push_str(word);
        } else {
            lines.push(std::mem::take(&mut line));
            line = word.to_string();
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }

    (font_size, lines.join("\n"))
}

/// Escape text for a drawtext parameter.
pub fn escape_drawtext(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('\'', "'\\''")
        .replace(':', "\\:")
        .replace('%', "\\%")
}

/// Build the full labeled chain for one segment of a chunk.
///
/// `input` is the index of the segment's first renderer input;
/// `motion_duration` is the probed source duration for motion segments.
pub fn segment_chain(
    segment: &RenderSegment,
    input: usize,
    segment_index: usize,
    motion_duration: Option<f64>,
    hold: f64,
    transition: f64,
    out_label: &str,
) -> String {
    match segment {
        RenderSegment::Still { .. } => {
            kenburns_chain(input, segment_index, hold, transition, out_label)
        }
        RenderSegment::Stack { .. } => {
            stack_chain([input, input + 1, input + 2], hold, transition, out_label)
        }
        RenderSegment::Motion { .. } => motion_chain(
            input,
            motion_duration.unwrap_or(hold),
            hold,
            transition,
            out_label,
        ),
    }
}
