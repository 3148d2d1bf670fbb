//! Porter suffix-stripping stemmer.
//!
//! Follows M.F. Porter, "An algorithm for suffix stripping" (1980), with the
//! extensions NLTK's `PorterStemmer` applies by default: an irregular-form
//! lookup, `ies`/`ied` handling for four-letter words, a stricter `y -> i`
//! rule, the recursive `alli` rule and the extra `fulli`/`lessli`/`logi`
//! step 2 rules. The model vocabulary is built from these stems, so any
//! divergence drops features. Input is expected to be lowercase ASCII;
//! anything else is returned unchanged.

/// Words stemmed by lookup instead of by rule.
const IRREGULAR_FORMS: &[(&str, &str)] = &[
    ("sky", "sky"),
    ("skies", "sky"),
    ("dying", "die"),
    ("lying", "lie"),
    ("tying", "tie"),
    ("news", "news"),
    ("innings", "inning"),
    ("inning", "inning"),
    ("outings", "outing"),
    ("outing", "outing"),
    ("cannings", "canning"),
    ("canning", "canning"),
    ("howe", "howe"),
    ("proceed", "proceed"),
    ("exceed", "exceed"),
    ("succeed", "succeed"),
];

const STEP2_RULES: &[(&str, &str)] = &[
    ("ational", "ate"),
    ("tional", "tion"),
    ("enci", "ence"),
    ("anci", "ance"),
    ("izer", "ize"),
    ("bli", "ble"),
    ("alli", "al"),
    ("entli", "ent"),
    ("eli", "e"),
    ("ousli", "ous"),
    ("ization", "ize"),
    ("ation", "ate"),
    ("ator", "ate"),
    ("alism", "al"),
    ("iveness", "ive"),
    ("fulness", "ful"),
    ("ousness", "ous"),
    ("aliti", "al"),
    ("iviti", "ive"),
    ("biliti", "ble"),
    ("fulli", "ful"),
    ("lessli", "less"),
];

const STEP3_RULES: &[(&str, &str)] = &[
    ("icate", "ic"),
    ("ative", ""),
    ("alize", "al"),
    ("iciti", "ic"),
    ("ical", "ic"),
    ("ful", ""),
    ("ness", ""),
];

// Order matters: the first matching suffix decides, even when its
// condition then fails.
const STEP4_SUFFIXES: &[&str] = &[
    "al", "ance", "ence", "er", "ic", "able", "ible", "ant", "ement", "ment", "ent", "ion", "ou",
    "ism", "ate", "iti", "ous", "ive", "ize",
];

/// Reduce a single lowercase word to its Porter stem.
pub fn stem(word: &str) -> String {
    if let Some((_, irregular)) = IRREGULAR_FORMS.iter().find(|(form, _)| *form == word) {
        return irregular.to_string();
    }
    if word.len() <= 2 || !word.bytes().all(|b| b.is_ascii_lowercase()) {
        return word.to_string();
    }

    let mut w = Word {
        b: word.as_bytes().to_vec(),
    };
    w.step1a();
    w.step1b();
    w.step1c();
    w.step2();
    w.step3();
    w.step4();
    w.step5a();
    w.step5b();
    w.b.into_iter().map(char::from).collect()
}

struct Word {
    b: Vec<u8>,
}

impl Word {
    fn is_consonant(&self, i: usize) -> bool {
        match self.b[i] {
            b'a' | b'e' | b'i' | b'o' | b'u' => false,
            b'y' => i == 0 || !self.is_consonant(i - 1),
            _ => true,
        }
    }

    /// Number of VC sequences in `b[..len]`.
    fn measure(&self, len: usize) -> usize {
        let mut m = 0;
        let mut i = 0;
        while i < len && self.is_consonant(i) {
            i += 1;
        }
        loop {
            while i < len && !self.is_consonant(i) {
                i += 1;
            }
            if i >= len {
                return m;
            }
            while i < len && self.is_consonant(i) {
                i += 1;
            }
            m += 1;
        }
    }

    fn has_vowel(&self, len: usize) -> bool {
        (0..len).any(|i| !self.is_consonant(i))
    }

    fn ends_double_consonant(&self, len: usize) -> bool {
        len >= 2 && self.b[len - 1] == self.b[len - 2] && self.is_consonant(len - 1)
    }

    /// consonant-vowel-consonant ending where the last consonant is not w, x
    /// or y. A two-letter vowel-consonant stem also counts.
    fn ends_cvc(&self, len: usize) -> bool {
        let cvc = len >= 3
            && self.is_consonant(len - 3)
            && !self.is_consonant(len - 2)
            && self.is_consonant(len - 1)
            && !matches!(self.b[len - 1], b'w' | b'x' | b'y');
        cvc || (len == 2 && !self.is_consonant(0) && self.is_consonant(1))
    }

    fn ends(&self, suffix: &str) -> bool {
        self.b.ends_with(suffix.as_bytes())
    }

    fn stem_len(&self, suffix: &str) -> usize {
        self.b.len() - suffix.len()
    }

    fn set_suffix(&mut self, suffix: &str, replacement: &str) {
        let len = self.stem_len(suffix);
        self.b.truncate(len);
        self.b.extend_from_slice(replacement.as_bytes());
    }

    fn apply_rules(&mut self, rules: &[(&str, &str)]) {
        if let Some((suffix, replacement)) = rules.iter().find(|(s, _)| self.ends(s)) {
            if self.measure(self.stem_len(suffix)) > 0 {
                self.set_suffix(suffix, replacement);
            }
        }
    }

    fn step1a(&mut self) {
        // dies -> die, but flies -> fli
        if self.b.len() == 4 && self.ends("ies") {
            self.set_suffix("ies", "ie");
        } else if self.ends("sses") {
            self.set_suffix("sses", "ss");
        } else if self.ends("ies") {
            self.set_suffix("ies", "i");
        } else if self.ends("s") && !self.ends("ss") {
            self.set_suffix("s", "");
        }
    }

    fn step1b(&mut self) {
        if self.ends("ied") {
            let replacement = if self.b.len() == 4 { "ie" } else { "i" };
            self.set_suffix("ied", replacement);
            return;
        }

        if self.ends("eed") {
            if self.measure(self.stem_len("eed")) > 0 {
                self.set_suffix("eed", "ee");
            }
            return;
        }

        let removed = ["ed", "ing"].into_iter().find(|suffix| {
            self.ends(suffix) && self.has_vowel(self.stem_len(suffix))
        });
        let Some(suffix) = removed else { return };
        self.set_suffix(suffix, "");

        let len = self.b.len();
        if self.ends("at") || self.ends("bl") || self.ends("iz") {
            self.b.push(b'e');
        } else if self.ends_double_consonant(len) {
            if !matches!(self.b[len - 1], b'l' | b's' | b'z') {
                self.b.pop();
            }
        } else if self.measure(len) == 1 && self.ends_cvc(len) {
            self.b.push(b'e');
        }
    }

    /// y -> i after a consonant that is not the first letter.
    fn step1c(&mut self) {
        if !self.ends("y") {
            return;
        }
        let len = self.stem_len("y");
        if len > 1 && self.is_consonant(len - 1) {
            self.set_suffix("y", "i");
        }
    }

    fn step2(&mut self) {
        if self.ends("alli") && self.measure(self.stem_len("alli")) > 0 {
            self.set_suffix("alli", "al");
            self.step2();
            return;
        }
        if self.ends("logi") {
            // the `l` stays with the stem, so geo-/theo- stems qualify
            if self.measure(self.stem_len("ogi")) > 0 {
                self.set_suffix("logi", "log");
            }
            return;
        }
        self.apply_rules(STEP2_RULES);
    }

    fn step3(&mut self) {
        self.apply_rules(STEP3_RULES);
    }

    fn step4(&mut self) {
        let Some(suffix) = STEP4_SUFFIXES.iter().find(|s| self.ends(s)) else {
            return;
        };
        let len = self.stem_len(suffix);
        if *suffix == "ion" && !(len > 0 && matches!(self.b[len - 1], b's' | b't')) {
            return;
        }
        if self.measure(len) > 1 {
            self.b.truncate(len);
        }
    }

    fn step5a(&mut self) {
        if !self.ends("e") {
            return;
        }
        let len = self.stem_len("e");
        let m = self.measure(len);
        if m > 1 || (m == 1 && !self.ends_cvc(len)) {
            self.b.truncate(len);
        }
    }

    fn step5b(&mut self) {
        let len = self.b.len();
        if self.ends("l") && self.ends_double_consonant(len) && self.measure(len) > 1 {
            self.b.pop();
        }
    }
}
