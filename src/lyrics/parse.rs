/// One time-tagged lyric line.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedLine {
    /// Seconds from the start of the track.
    pub time: f64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Lyrics {
    Plain(Vec<String>),
    Timed(Vec<TimedLine>),
}

impl Lyrics {
    /// Parse raw lyrics. Text with at least one `[mm:ss.xx]` tag is treated
    /// as timed; untagged lines in timed text are dropped.
    pub fn parse(raw: &str) -> Self {
        let mut timed: Vec<TimedLine> = Vec::new();
        let mut any_tag = false;

        for line in raw.lines() {
            let (times, text) = split_tags(line);
            if times.is_empty() {
                continue;
            }
            any_tag = true;
            for time in times {
                timed.push(TimedLine {
                    time,
                    text: text.to_string(),
                });
            }
        }

        if any_tag {
            timed.sort_by(|a, b| a.time.total_cmp(&b.time));
            Self::Timed(timed)
        } else {
            Self::Plain(raw.lines().map(|l| l.trim_end().to_string()).collect())
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Plain(lines) => lines.len(),
            Self::Timed(lines) => lines.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_timed(&self) -> bool {
        matches!(self, Self::Timed(_))
    }

    pub fn text(&self, i: usize) -> Option<&str> {
        match self {
            Self::Plain(lines) => lines.get(i).map(String::as_str),
            Self::Timed(lines) => lines.get(i).map(|l| l.text.as_str()),
        }
    }

    /// Timestamp of line `i`, for timed lyrics only.
    pub fn time_of(&self, i: usize) -> Option<f64> {
        match self {
            Self::Plain(_) => None,
            Self::Timed(lines) => lines.get(i).map(|l| l.time),
        }
    }

    /// Index of the line being sung at `position` seconds.
    pub fn line_at(&self, position: f64) -> Option<usize> {
        match self {
            Self::Plain(_) => None,
            Self::Timed(lines) => lines
                .partition_point(|l| l.time <= position)
                .checked_sub(1),
        }
    }
}

/// Split leading `[..]` tags off a line, returning parsed timestamps and the
/// remaining text. Metadata tags like `[ar:Someone]` yield no timestamps.
fn split_tags(line: &str) -> (Vec<f64>, &str) {
    let mut rest = line.trim();
    let mut times = Vec::new();

    while let Some(stripped) = rest.strip_prefix('[') {
        let Some(close) = stripped.find(']') else {
            break;
        };
        let tag = &stripped[..close];
        match parse_timestamp(tag) {
            Some(t) => times.push(t),
            None if times.is_empty() => return (Vec::new(), rest),
            None => break,
        }
        rest = stripped[close + 1..].trim_start();
    }

    (times, rest.trim_end())
}

/// `mm:ss`, `mm:ss.xx` or `mm:ss:xx`.
fn parse_timestamp(tag: &str) -> Option<f64> {
    let (min, sec) = tag.split_once(':')?;
    let minutes: u32 = min.trim().parse().ok()?;
    let sec = sec.trim().replacen(':', ".", 1);
    let seconds: f64 = sec.parse().ok()?;
    if !(0.0..60.0).contains(&seconds) {
        return None;
    }
    Some(minutes as f64 * 60.0 + seconds)
}
