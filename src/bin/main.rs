fn main() {
    minerpool::main();
}
