use orderflow::*;

#[test]
fn explain_tracks_execution_modes() {
    let chain = ProcessChain::<String>::new(LogContext::new("words"))
        .explode(|s: &String| s.split(',').map(str::to_string).collect::<Vec<_>>())
        .parallel(4)
        .map(|s: &String| s.len())
        .unordered()
        .filter(|n: &usize| *n > 1)
        .sort(|a: &usize, b: &usize| a.cmp(b));

    let ex = chain.explain();
    assert_eq!(ex.realm, "words");
    assert_eq!(ex.steps.len(), 6);
    assert_eq!(ex.barriers, 1);

    let modes: Vec<ExecutionMode> = ex.steps.iter().map(|s| s.mode).collect();
    assert_eq!(
        modes,
        vec![
            ExecutionMode::Synchronous,
            ExecutionMode::ParallelOrdered,
            ExecutionMode::ParallelOrdered,
            ExecutionMode::ParallelUnordered,
            ExecutionMode::ParallelUnordered,
            ExecutionMode::ParallelOrdered,
        ]
    );
    assert_eq!(ex.steps[1].kind, StepKind::WithPool { workers: 4 });
    assert!(ex.steps[5].is_barrier);
    assert_eq!(ex.final_mode, ExecutionMode::ParallelOrdered);
}

#[test]
fn explain_includes_appended_steps() {
    let tail = filter(|x: &i32| *x > 0).map(|x: &i32| x + 1);
    let chain = map(|x: &i32| x - 1).append_if(true, &tail);
    let kinds: Vec<StepKind> = chain.explain().steps.into_iter().map(|s| s.kind).collect();
    assert_eq!(kinds, vec![StepKind::Map, StepKind::Filter, StepKind::Map]);
}

#[test]
fn explain_display_lists_steps() {
    let chain = parallel::<i32>(2).map(|x: &i32| x * 2).sort(|a: &i32, b: &i32| a.cmp(b));
    let text = chain.explain().to_string();
    assert!(text.contains("PROCESS CHAIN EXPLANATION"));
    assert!(text.contains("Step 1: WithPool"));
    assert!(text.contains("Step 3: Sort [BARRIER]"));
    assert!(text.contains("Mode: parallel, ordered"));
}

#[cfg(feature = "json")]
#[test]
fn explain_renders_json() -> anyhow::Result<()> {
    let chain = unordered::<i32>().try_map(|x: &i32| u8::try_from(*x));
    let json: serde_json::Value = serde_json::from_str(&chain.explain().to_json()?)?;
    assert_eq!(json["realm"], "processing");
    assert_eq!(json["steps"][0]["kind"]["step"], "unordered");
    assert_eq!(json["steps"][1]["kind"]["step"], "try_map");
    assert_eq!(json["final_mode"], "synchronous");
    Ok(())
}
