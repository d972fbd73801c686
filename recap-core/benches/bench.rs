use criterion::{black_box, criterion_group, criterion_main, Criterion};
use recap_core::{Match, PatternCache, Regex, RegexOptions};

fn bench_basic_matching(c: &mut Criterion) {
    let pattern = Regex::new(r"hello\s+\w+").unwrap();
    let input = "hello world this is a test hello universe";

    c.bench_function("basic_match", |b| {
        b.iter(|| black_box(pattern.find(black_box(input))))
    });
}

fn bench_backreferences(c: &mut Criterion) {
    let pattern = Regex::new(r"(\w)(\w)\2\1").unwrap();
    let input = "abcd efgh abba ijkl";

    c.bench_function("backref_match", |b| {
        b.iter(|| black_box(pattern.find(black_box(input))))
    });
}

fn bench_named_groups(c: &mut Criterion) {
    let pattern = Regex::new(r"(?<name>\w+) is \k<name>").unwrap();
    let input = "John is John and Jane is Jane";

    c.bench_function("named_group_match", |b| {
        b.iter(|| black_box(pattern.find(black_box(input))))
    });
}

fn bench_complex_pattern(c: &mut Criterion) {
    let pattern = Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").unwrap();
    let input = "Contact us at test@example.com or admin@company.org";

    c.bench_function("complex_match", |b| {
        b.iter(|| black_box(pattern.find_iter(black_box(input)).count()))
    });
}

fn bench_find_all(c: &mut Criterion) {
    let pattern = Regex::new(r"\d+").unwrap();
    let input = "abc 123 def 456 ghi 789 jkl 012 mno 345 pqr 678 stu 901";

    c.bench_function("find_all_numbers", |b| {
        b.iter(|| black_box(pattern.find_iter(black_box(input)).count()))
    });
}

fn bench_case_insensitive(c: &mut Criterion) {
    let pattern = Regex::with_options("needle", RegexOptions::from_flags("i")).unwrap();
    let input = "haystack ".repeat(50) + "NeEdLe";

    c.bench_function("case_insensitive_scan", |b| {
        b.iter(|| black_box(pattern.is_match(black_box(&input))))
    });
}

fn bench_template_replace(c: &mut Criterion) {
    let pattern = Regex::new(r"(?<y>\d{4})-(?<m>\d\d)-(?<d>\d\d)").unwrap();
    let input = "2024-01-02, 2023-11-30 and 1999-12-31";

    c.bench_function("template_replace", |b| {
        b.iter(|| black_box(pattern.replace(black_box(input), "${d}/${m}/${y}")))
    });
}

fn bench_callback_replace(c: &mut Criterion) {
    let pattern = Regex::new(r"\w+").unwrap();
    let input = "the quick brown fox jumps over the lazy dog";

    c.bench_function("callback_replace", |b| {
        b.iter(|| {
            black_box(pattern.replace(black_box(input), |m: &Match<'_>| m.as_str().to_uppercase()))
        })
    });
}

fn bench_cache_lookup(c: &mut Criterion) {
    let cache = PatternCache::new();
    cache.get_or_compile(r"\d+", RegexOptions::NONE).unwrap();

    c.bench_function("cache_hit", |b| {
        b.iter(|| black_box(cache.get_or_compile(black_box(r"\d+"), RegexOptions::NONE)))
    });
    c.bench_function("compile_uncached", |b| {
        b.iter(|| black_box(Regex::new(black_box(r"(\w+)@(\w+)\.com"))))
    });
}

criterion_group!(
    benches,
    bench_basic_matching,
    bench_backreferences,
    bench_named_groups,
    bench_complex_pattern,
    bench_find_all,
    bench_case_insensitive,
    bench_template_replace,
    bench_callback_replace,
    bench_cache_lookup,
);

criterion_main!(benches);
