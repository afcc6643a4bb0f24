fn main() {
  keymatch::run();
}
